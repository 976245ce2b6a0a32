//! Playback resource capability
//!
//! The decoder/renderer that actually produces sound is outside this crate.
//! A session drives it through [`PlaybackResource`] and creates it lazily
//! through a [`ResourceFactory`]; at most one instance exists per session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use super::events::SessionCommand;

/// Why a resource could not load a clip
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Nothing exists at the URI
    #[error("source not found: {0}")]
    MissingSource(String),

    /// URI could not be interpreted
    #[error("malformed source URI: {0:?}")]
    Malformed(String),

    /// Source exists but could not be opened or prepared
    #[error("failed to prepare {uri}: {reason}")]
    Io { uri: String, reason: String },
}

/// A single handle that plays one loaded clip at a time
///
/// Calls other than `load` are fire-and-forget. Offsets are milliseconds from
/// the start of the loaded clip.
pub trait PlaybackResource: Send {
    /// Load `uri`, replacing (and stopping) whatever was loaded
    ///
    /// On failure the previously loaded clip must be left as it was.
    fn load(&mut self, uri: &str) -> Result<(), LoadError>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Stop playback and rewind; the clip stays loaded
    fn stop(&mut self);

    fn seek_to(&mut self, position_ms: u64);

    fn current_position(&self) -> u64;

    /// Free the underlying resource. Called exactly once.
    fn release(self)
    where
        Self: Sized;
}

/// Creates playback resources on demand
///
/// Implemented for any `FnMut(CompletionNotifier) -> R` closure.
pub trait ResourceFactory: Send {
    type Resource: PlaybackResource;

    /// Allocate a resource. `completion` must be used to report the natural
    /// end of each clip.
    fn create(&mut self, completion: CompletionNotifier) -> Self::Resource;
}

impl<F, R> ResourceFactory for F
where
    F: FnMut(CompletionNotifier) -> R + Send,
    R: PlaybackResource,
{
    type Resource = R;

    fn create(&mut self, completion: CompletionNotifier) -> R {
        self(completion)
    }
}

/// Channel back into the session for end-of-clip notifications
///
/// Holds only a weak reference to the session inbox: a resource never keeps
/// its session alive. Notifications are tagged with the allocation epoch and
/// with the play run current when the notification is sent, so a session
/// ignores completions from a released resource and completions that belong
/// to a run it has since replaced (new clip, pause, stop or seek).
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    inbox: mpsc::WeakUnboundedSender<SessionCommand>,
    epoch: u64,
    runs: RunCounter,
}

impl CompletionNotifier {
    pub(crate) fn new(inbox: mpsc::WeakUnboundedSender<SessionCommand>, epoch: u64) -> Self {
        Self {
            inbox,
            epoch,
            runs: RunCounter::default(),
        }
    }

    /// A notifier attached to no session; notifications are discarded
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self::new(tx.downgrade(), 0)
    }

    /// Report that the loaded clip played to its end
    pub fn notify(&self) {
        let command = SessionCommand::Completion {
            epoch: self.epoch,
            run: self.runs.current(),
        };
        match self.inbox.upgrade() {
            Some(tx) => {
                let _ = tx.send(command);
            }
            None => debug!("Completion dropped, session already closed"),
        }
    }

    /// Run counter shared with the session that owns the resource
    pub(crate) fn runs(&self) -> RunCounter {
        self.runs.clone()
    }
}

/// Identifies the current play run of one resource allocation
///
/// The session advances it before every command that invalidates a pending
/// end-of-clip; the notifier reads it at send time.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunCounter(Arc<AtomicU64>);

impl RunCounter {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Start a new run, returning its id
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}
