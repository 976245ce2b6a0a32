//! Playback session types
//!
//! Caller-facing values: what to play, and the read-only projections a
//! session publishes about what it is doing.

use clipdeck_common::ClipId;
use std::collections::VecDeque;

/// A clip to play: its id plus the URI the playback resource loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSource {
    pub clip_id: ClipId,
    pub uri: String,
}

impl ClipSource {
    pub fn new(clip_id: impl Into<ClipId>, uri: impl Into<String>) -> Self {
        Self {
            clip_id: clip_id.into(),
            uri: uri.into(),
        }
    }
}

impl<I: Into<ClipId>, U: Into<String>> From<(I, U)> for ClipSource {
    fn from((clip_id, uri): (I, U)) -> Self {
        Self::new(clip_id, uri)
    }
}

/// Clips waiting to play, consumed front first
///
/// An empty playlist is a valid terminal value: nothing is queued after the
/// current clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist(VecDeque<ClipSource>);

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(clip: ClipSource) -> Self {
        Self(VecDeque::from([clip]))
    }

    pub fn pop_front(&mut self) -> Option<ClipSource> {
        self.0.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clip_ids(&self) -> Vec<ClipId> {
        self.0.iter().map(|clip| clip.clip_id.clone()).collect()
    }
}

impl FromIterator<ClipSource> for Playlist {
    fn from_iter<T: IntoIterator<Item = ClipSource>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The clip a session is focused on, as seen by observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentlyPlaying {
    pub clip_id: ClipId,
    pub paused: bool,
}

impl CurrentlyPlaying {
    /// True if `clip_id` is this clip and it is not paused
    pub fn is_playing(&self, clip_id: &ClipId) -> bool {
        !self.paused && &self.clip_id == clip_id
    }
}

/// Most recent load failure
///
/// Overwritten by each new failure; observers only ever see the latest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackFailure {
    /// URI the resource could not load
    pub uri: String,
    pub reason: String,
}

/// Point-in-time view of a session, answered by the session actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub currently_playing: Option<CurrentlyPlaying>,
    /// Clips that will play after the current one finishes naturally
    pub remaining: Vec<ClipId>,
    /// Whether the session currently holds a playback resource
    pub resource_allocated: bool,
}
