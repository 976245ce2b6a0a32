//! Public session handle
//!
//! [`PlaybackSession`] is the cloneable front door to a session actor. Every
//! operation is a message into the actor's inbox and returns immediately;
//! results are observed through `watch` channels and the event bus.

use clipdeck_common::events::{ClipdeckEvent, EventBus};
use clipdeck_common::ClipId;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::error::{Error, Result};

use super::events::SessionCommand;
use super::poller::{PositionPoller, Scheduler};
use super::positions::PositionStore;
use super::resource::ResourceFactory;
use super::session::{SessionCore, SessionOutputs};
use super::types::{ClipSource, CurrentlyPlaying, PlaybackFailure, Playlist, SessionSnapshot};

/// Handle to a running playback session
///
/// Dropping every handle tears the session down.
#[derive(Clone)]
pub struct PlaybackSession {
    id: Uuid,
    commands: mpsc::UnboundedSender<SessionCommand>,
    currently_playing: watch::Receiver<Option<CurrentlyPlaying>>,
    errors: watch::Receiver<Option<PlaybackFailure>>,
    positions: PositionStore,
    events: EventBus,
}

impl PlaybackSession {
    /// Start a session actor on the current tokio runtime
    ///
    /// The resource is not created until the first clip is played. The
    /// returned task finishes after teardown.
    pub fn spawn<F, S>(factory: F, scheduler: S, settings: &SessionSettings) -> (Self, JoinHandle<()>)
    where
        F: ResourceFactory + 'static,
        F::Resource: 'static,
        S: Scheduler + 'static,
    {
        let id = Uuid::new_v4();
        let events = EventBus::new(settings.event_capacity);
        let outputs = SessionOutputs::new(events.clone());
        let currently_playing = outputs.currently_playing.subscribe();
        let errors = outputs.errors.subscribe();
        let positions = PositionStore::new();

        let (commands, inbox) = mpsc::unbounded_channel();
        let core = SessionCore::new(
            factory,
            PositionPoller::new(scheduler, settings.poll_interval()),
            positions.clone(),
            outputs,
            commands.downgrade(),
        );

        let task = tokio::spawn(run_session(core, inbox).instrument(info_span!("session", id = %id)));

        let session = Self {
            id,
            commands,
            currently_playing,
            errors,
            positions,
            events,
        };
        (session, task)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Play one clip, stopping whatever else is loaded
    ///
    /// Playing the clip that is already loaded resumes it from its stored
    /// position without reloading.
    pub fn play(&self, clip_id: impl Into<ClipId>, uri: impl Into<String>) {
        self.send(SessionCommand::Play(Playlist::single(ClipSource::new(
            clip_id, uri,
        ))));
    }

    /// Play clips one after another, advancing on natural completion
    ///
    /// If a clip fails to load, sequencing stops there: later clips are
    /// dropped, not skipped to.
    pub fn play_in_order<I>(&self, clips: I)
    where
        I: IntoIterator,
        I::Item: Into<ClipSource>,
    {
        let playlist: Playlist = clips.into_iter().map(Into::<ClipSource>::into).collect();
        self.send(SessionCommand::Play(playlist));
    }

    /// Stop and rewind the active clip. Does nothing when idle.
    pub fn stop(&self) {
        self.send(SessionCommand::Stop);
    }

    /// Pause the active clip. Does nothing when idle.
    pub fn pause(&self) {
        self.send(SessionCommand::Pause);
    }

    /// Set a clip's stored position, seeking immediately if it is loaded
    pub fn set_position(&self, clip_id: impl Into<ClipId>, position_ms: u64) {
        self.send(SessionCommand::SetPosition {
            clip_id: clip_id.into(),
            position_ms,
        });
    }

    /// Unload and release the playback resource; the session stays usable
    pub fn background(&self) {
        self.send(SessionCommand::Background);
    }

    /// Release everything and end the session
    pub fn teardown(&self) {
        self.send(SessionCommand::Teardown);
    }

    /// Observe whether `clip_id` is the clip currently playing (not paused)
    pub fn is_playing(&self, clip_id: impl Into<ClipId>) -> IsPlaying {
        IsPlaying {
            clip_id: clip_id.into(),
            rx: self.currently_playing.clone(),
        }
    }

    /// Observe the stored position of `clip_id` (0 if never played)
    pub fn position(&self, clip_id: impl Into<ClipId>) -> watch::Receiver<u64> {
        self.positions.subscribe(&clip_id.into())
    }

    /// Observe the active clip and its paused flag (`None` when idle)
    pub fn currently_playing(&self) -> watch::Receiver<Option<CurrentlyPlaying>> {
        self.currently_playing.clone()
    }

    /// Observe the latest load failure
    pub fn errors(&self) -> watch::Receiver<Option<PlaybackFailure>> {
        self.errors.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClipdeckEvent> {
        self.events.subscribe()
    }

    /// Current state, after every previously sent operation has been applied
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Snapshot(reply))
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            debug!(session = %self.id, "Session closed, dropping command");
        }
    }
}

/// Observable "is this clip playing" flag
pub struct IsPlaying {
    clip_id: ClipId,
    rx: watch::Receiver<Option<CurrentlyPlaying>>,
}

impl IsPlaying {
    pub fn clip_id(&self) -> &ClipId {
        &self.clip_id
    }

    pub fn get(&self) -> bool {
        Self::evaluate(&self.rx.borrow(), &self.clip_id)
    }

    /// Wait until the flag flips, returning the new value
    pub async fn changed(&mut self) -> Result<bool> {
        let before = self.get();
        loop {
            self.rx.changed().await.map_err(|_| Error::SessionClosed)?;
            let now = Self::evaluate(&self.rx.borrow_and_update(), &self.clip_id);
            if now != before {
                return Ok(now);
            }
        }
    }

    fn evaluate(current: &Option<CurrentlyPlaying>, clip_id: &ClipId) -> bool {
        current
            .as_ref()
            .is_some_and(|playing| playing.is_playing(clip_id))
    }
}

/// Actor loop: the only place session state is mutated
async fn run_session<F, S>(
    mut core: SessionCore<F, S>,
    mut inbox: mpsc::UnboundedReceiver<SessionCommand>,
) where
    F: ResourceFactory,
    S: Scheduler,
{
    info!("Playback session started");

    while let Some(command) = inbox.recv().await {
        if core.handle(command).is_break() {
            info!("Playback session torn down");
            return;
        }
    }

    info!("All session handles dropped, tearing down");
    core.teardown();
}
