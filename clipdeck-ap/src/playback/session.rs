//! Session state machine
//!
//! `SessionCore` owns everything mutable about a session: the state, the
//! (optional) playback resource, the position store writer side and the
//! poller. It is driven one message at a time by the session actor, which
//! is the only writer.

use std::ops::ControlFlow;

use clipdeck_common::events::{ClipdeckEvent, EventBus, PlaybackState, ReleaseReason};
use clipdeck_common::ClipId;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::events::SessionCommand;
use super::poller::{PositionPoller, Scheduler};
use super::positions::PositionStore;
use super::resource::{CompletionNotifier, LoadError, PlaybackResource, ResourceFactory, RunCounter};
use super::state::{ActiveClip, SessionState};
use super::types::{ClipSource, CurrentlyPlaying, PlaybackFailure, Playlist, SessionSnapshot};

/// Result of one sequencing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SequenceOutcome {
    /// Playlist was empty; session is idle
    Settled,
    /// Clip is playing. `reloaded` is false when it was already loaded.
    Started { clip_id: ClipId, reloaded: bool },
    /// Loading failed; state untouched and the rest of the playlist dropped
    Failed(PlaybackFailure),
}

/// Write side of everything a session publishes
pub(crate) struct SessionOutputs {
    pub currently_playing: watch::Sender<Option<CurrentlyPlaying>>,
    pub errors: watch::Sender<Option<PlaybackFailure>>,
    pub events: EventBus,
}

impl SessionOutputs {
    pub fn new(events: EventBus) -> Self {
        Self {
            currently_playing: watch::channel(None).0,
            errors: watch::channel(None).0,
            events,
        }
    }
}

/// A resource together with the epoch it was allocated in
struct Allocated<R> {
    resource: R,
    epoch: u64,
    /// Shared with the resource's completion notifier
    runs: RunCounter,
}

pub(crate) struct SessionCore<F: ResourceFactory, S: Scheduler> {
    factory: F,
    resource: Option<Allocated<F::Resource>>,
    next_epoch: u64,
    state: SessionState,
    positions: PositionStore,
    poller: PositionPoller<S>,
    outputs: SessionOutputs,
    inbox: mpsc::WeakUnboundedSender<SessionCommand>,
}

impl<F: ResourceFactory, S: Scheduler> SessionCore<F, S> {
    pub fn new(
        factory: F,
        poller: PositionPoller<S>,
        positions: PositionStore,
        outputs: SessionOutputs,
        inbox: mpsc::WeakUnboundedSender<SessionCommand>,
    ) -> Self {
        Self {
            factory,
            resource: None,
            next_epoch: 1,
            state: SessionState::Idle,
            positions,
            poller,
            outputs,
            inbox,
        }
    }

    /// Apply one message. Returns `Break` once the session has been torn down.
    pub fn handle(&mut self, command: SessionCommand) -> ControlFlow<()> {
        match command {
            SessionCommand::Play(playlist) => {
                self.sequence(playlist);
            }
            SessionCommand::Stop => self.stop(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::SetPosition {
                clip_id,
                position_ms,
            } => self.set_position(&clip_id, position_ms),
            SessionCommand::Background => self.background(),
            SessionCommand::Completion { epoch, run } => self.on_completion(epoch, run),
            SessionCommand::SamplePosition { generation } => self.sample_position(generation),
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Teardown => {
                self.teardown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Play the head of `playlist`, queueing the rest behind it
    pub fn sequence(&mut self, mut playlist: Playlist) -> SequenceOutcome {
        let Some(ClipSource { clip_id, uri }) = playlist.pop_front() else {
            self.reset_clip();
            self.unload_clip();
            return SequenceOutcome::Settled;
        };

        let reloaded = !self.state.is_active_clip(&clip_id);
        if reloaded {
            if let Err(error) = self.ensure_resource().load(&uri) {
                return SequenceOutcome::Failed(self.report_failure(&uri, &error));
            }
        }

        let position_ms = self.positions.get(&clip_id);
        self.begin_run();
        let resource = self.ensure_resource();
        resource.seek_to(position_ms);
        resource.play();

        info!(
            clip = %clip_id,
            position_ms,
            reloaded,
            queued = playlist.len(),
            "Playing clip"
        );
        let old_state = self.state.playback_state();
        self.state = SessionState::Active(ActiveClip {
            clip_id: clip_id.clone(),
            paused: false,
            remaining: playlist,
        });
        self.publish_state(old_state);
        self.poller.start(&self.inbox);

        self.outputs.events.emit_lossy(ClipdeckEvent::ClipStarted {
            clip_id: clip_id.clone(),
            uri,
            position_ms,
            reloaded,
            timestamp: chrono::Utc::now(),
        });
        SequenceOutcome::Started { clip_id, reloaded }
    }

    pub fn stop(&mut self) {
        if let (SessionState::Active(_), Some(allocated)) = (&self.state, self.resource.as_mut()) {
            allocated.runs.advance();
            allocated.resource.stop();
        }
        self.reset_clip();
        self.unload_clip();
    }

    pub fn pause(&mut self) {
        let SessionState::Active(active) = &mut self.state else {
            debug!("pause() ignored: no active clip");
            return;
        };
        if active.paused {
            return;
        }
        active.paused = true;
        let clip_id = active.clip_id.clone();

        // Polling stops here, so keep the paused offset for resume
        let paused_at = self.resource.as_mut().map(|allocated| {
            allocated.runs.advance();
            allocated.resource.pause();
            allocated.resource.current_position()
        });
        if let Some(position_ms) = paused_at {
            self.record_position(&clip_id, position_ms);
        }
        info!(clip = %clip_id, position_ms = ?paused_at, "Paused");

        self.poller.stop();
        self.publish_state(PlaybackState::Playing);
    }

    /// Store a position; seek immediately if `clip_id` is the loaded clip
    pub fn set_position(&mut self, clip_id: &ClipId, position_ms: u64) {
        if self.state.is_active_clip(clip_id) {
            if let Some(allocated) = self.resource.as_mut() {
                allocated.runs.advance();
                allocated.resource.seek_to(position_ms);
            }
        }
        self.positions.set(clip_id, position_ms);
    }

    /// Natural end of the loaded clip
    ///
    /// Only honored for the current allocation and play run, and only while
    /// the clip is playing.
    pub fn on_completion(&mut self, epoch: u64, run: u64) {
        let Some(allocated) = self.resource.as_ref() else {
            debug!(epoch, "Ignoring completion with no resource");
            return;
        };
        if allocated.epoch != epoch {
            debug!(epoch, "Ignoring completion from a released resource");
            return;
        }
        if allocated.runs.current() != run {
            debug!(run, current = allocated.runs.current(), "Ignoring completion from a replaced run");
            return;
        }
        let Some(completed) = self.state.playing_clip_id().cloned() else {
            debug!("Ignoring completion while idle or paused");
            return;
        };

        self.reset_clip();
        let remaining = self.unload_clip();
        info!(clip = %completed, queued = remaining.len(), "Clip completed");
        self.outputs.events.emit_lossy(ClipdeckEvent::ClipCompleted {
            clip_id: completed,
            remaining: remaining.len(),
            timestamp: chrono::Utc::now(),
        });

        if !remaining.is_empty() {
            self.sequence(remaining);
        }
    }

    /// App moved to the background: unload and give the resource back
    pub fn background(&mut self) {
        self.reset_clip();
        self.unload_clip();
        self.release_resource(ReleaseReason::Background);
    }

    pub fn teardown(&mut self) {
        self.poller.stop();
        let old_state = self.state.playback_state();
        self.state = SessionState::Idle;
        self.publish_state(old_state);
        self.release_resource(ReleaseReason::Teardown);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            currently_playing: self.state.currently_playing(),
            remaining: match &self.state {
                SessionState::Active(active) => active.remaining.clip_ids(),
                SessionState::Idle => Vec::new(),
            },
            resource_allocated: self.resource.is_some(),
        }
    }

    fn sample_position(&mut self, generation: u64) {
        if !self.poller.accepts(generation) {
            return;
        }
        let (Some(clip_id), Some(allocated)) = (self.state.playing_clip_id(), self.resource.as_ref())
        else {
            return;
        };

        let position_ms = allocated.resource.current_position();
        self.record_position(clip_id, position_ms);
    }

    /// Store a sampled offset, publishing it if it changed
    fn record_position(&self, clip_id: &ClipId, position_ms: u64) {
        if self.positions.set(clip_id, position_ms) {
            self.outputs.events.emit_lossy(ClipdeckEvent::PlaybackPosition {
                clip_id: clip_id.clone(),
                position_ms,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Invalidate any end-of-clip the resource has already reported
    fn begin_run(&self) {
        if let Some(allocated) = self.resource.as_ref() {
            allocated.runs.advance();
        }
    }

    /// The allocated resource, creating it if the session has none
    fn ensure_resource(&mut self) -> &mut F::Resource {
        let Self {
            factory,
            resource,
            next_epoch,
            inbox,
            ..
        } = self;

        let allocated = resource.get_or_insert_with(|| {
            let epoch = *next_epoch;
            *next_epoch += 1;
            info!(epoch, "Allocating playback resource");
            let completion = CompletionNotifier::new(inbox.clone(), epoch);
            let runs = completion.runs();
            Allocated {
                resource: factory.create(completion),
                epoch,
                runs,
            }
        });
        &mut allocated.resource
    }

    fn release_resource(&mut self, reason: ReleaseReason) {
        if let Some(allocated) = self.resource.take() {
            allocated.resource.release();
            info!(epoch = allocated.epoch, %reason, "Released playback resource");
            self.outputs.events.emit_lossy(ClipdeckEvent::ResourceReleased {
                reason,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Rewind the stored position of the active clip
    fn reset_clip(&mut self) {
        if let Some(clip_id) = self.state.active_clip_id() {
            self.positions.reset(clip_id);
        }
    }

    /// Stop polling and go idle, returning what was queued behind the clip
    fn unload_clip(&mut self) -> Playlist {
        self.poller.stop();
        let old_state = self.state.playback_state();
        let remaining = self.state.take_remaining();
        self.publish_state(old_state);
        remaining
    }

    fn report_failure(&mut self, uri: &str, error: &LoadError) -> PlaybackFailure {
        warn!(uri, %error, "Failed to load clip");
        let failure = PlaybackFailure {
            uri: uri.to_string(),
            reason: error.to_string(),
        };
        self.outputs.errors.send_replace(Some(failure.clone()));
        self.outputs.events.emit_lossy(ClipdeckEvent::PlaybackFailed {
            uri: failure.uri.clone(),
            reason: failure.reason.clone(),
            timestamp: chrono::Utc::now(),
        });
        failure
    }

    /// Push the current state to observers if it changed
    fn publish_state(&self, old_state: PlaybackState) {
        let current = self.state.currently_playing();
        let changed = self.outputs.currently_playing.send_if_modified(|published| {
            if *published == current {
                false
            } else {
                *published = current.clone();
                true
            }
        });

        if changed {
            self.outputs
                .events
                .emit_lossy(ClipdeckEvent::PlaybackStateChanged {
                    clip_id: current.map(|playing| playing.clip_id),
                    old_state,
                    new_state: self.state.playback_state(),
                    timestamp: chrono::Utc::now(),
                });
        }
    }
}
