//! Event types for the clipdeck event system
//!
//! Provides shared event definitions and EventBus for all clipdeck crates.

mod playback_types;

pub use playback_types::{PlaybackState, ReleaseReason};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ClipId;

/// clipdeck event types
///
/// Events are broadcast via EventBus and can be serialized (one JSON object
/// per event, tagged by `type`) for consumers outside the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClipdeckEvent {
    /// Session state changed (Idle / Playing / Paused)
    PlaybackStateChanged {
        /// Clip in focus after the change (None when idle)
        clip_id: Option<ClipId>,
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clip was loaded (or resumed) and playback started
    ClipStarted {
        clip_id: ClipId,
        uri: String,
        /// Offset playback started from (milliseconds)
        position_ms: u64,
        /// False when the clip was already loaded and only resumed
        reloaded: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clip reached its natural end
    ClipCompleted {
        clip_id: ClipId,
        /// Number of clips still queued behind it
        remaining: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clip could not be loaded; the sequencing step was abandoned
    PlaybackFailed {
        uri: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sampled playback position of the playing clip
    ///
    /// Emitted on every poller tick that observes a new offset. Lossy: not
    /// delivered if nobody is subscribed.
    PlaybackPosition {
        clip_id: ClipId,
        position_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The playback resource was released
    ResourceReleased {
        reason: ReleaseReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ClipdeckEvent {
    /// Event type name as it appears in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            ClipdeckEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            ClipdeckEvent::ClipStarted { .. } => "ClipStarted",
            ClipdeckEvent::ClipCompleted { .. } => "ClipCompleted",
            ClipdeckEvent::PlaybackFailed { .. } => "PlaybackFailed",
            ClipdeckEvent::PlaybackPosition { .. } => "PlaybackPosition",
            ClipdeckEvent::ResourceReleased { .. } => "ResourceReleased",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use clipdeck_common::events::{ClipdeckEvent, EventBus, PlaybackState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(ClipdeckEvent::PlaybackStateChanged {
///     clip_id: None,
///     old_state: PlaybackState::Playing,
///     new_state: PlaybackState::Idle,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClipdeckEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped (the subscriber then sees `Lagged`).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClipdeckEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ClipdeckEvent,
    ) -> Result<usize, broadcast::error::SendError<ClipdeckEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClipdeckEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
