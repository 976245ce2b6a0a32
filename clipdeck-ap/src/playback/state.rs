//! Session state machine values

use clipdeck_common::events::PlaybackState;
use clipdeck_common::ClipId;

use super::types::{CurrentlyPlaying, Playlist};

/// Current state of a playback session
///
/// `Active` implies the session holds an allocated playback resource with
/// `clip_id` loaded into it.
#[derive(Debug, Default)]
pub(crate) enum SessionState {
    /// No clip loaded
    #[default]
    Idle,
    Active(ActiveClip),
}

/// The clip loaded into the playback resource
#[derive(Debug)]
pub(crate) struct ActiveClip {
    pub clip_id: ClipId,
    pub paused: bool,
    /// What plays after this clip finishes naturally
    pub remaining: Playlist,
}

impl SessionState {
    pub fn active_clip_id(&self) -> Option<&ClipId> {
        match self {
            SessionState::Active(active) => Some(&active.clip_id),
            SessionState::Idle => None,
        }
    }

    pub fn is_active_clip(&self, clip_id: &ClipId) -> bool {
        self.active_clip_id() == Some(clip_id)
    }

    /// Active clip, only if it is not paused
    pub fn playing_clip_id(&self) -> Option<&ClipId> {
        match self {
            SessionState::Active(active) if !active.paused => Some(&active.clip_id),
            _ => None,
        }
    }

    pub fn currently_playing(&self) -> Option<CurrentlyPlaying> {
        match self {
            SessionState::Active(active) => Some(CurrentlyPlaying {
                clip_id: active.clip_id.clone(),
                paused: active.paused,
            }),
            SessionState::Idle => None,
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        match self {
            SessionState::Idle => PlaybackState::Idle,
            SessionState::Active(active) if active.paused => PlaybackState::Paused,
            SessionState::Active(_) => PlaybackState::Playing,
        }
    }

    /// Move to `Idle`, returning the playlist that was queued behind the
    /// active clip (empty if already idle)
    pub fn take_remaining(&mut self) -> Playlist {
        match std::mem::take(self) {
            SessionState::Active(active) => active.remaining,
            SessionState::Idle => Playlist::new(),
        }
    }
}
