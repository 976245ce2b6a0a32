//! # clipdeck Audio Player Library (clipdeck-ap)
//!
//! Playback session controller for queues of named audio clips.
//!
//! **Purpose:** Sequence clips through a single lazily-created playback
//! resource, track per-clip positions, and expose play/pause/stop/seek with
//! observable state for a UI layer.
//!
//! **Architecture:** One actor task per session owns all mutable state; caller
//! operations, poller ticks and resource completions all arrive as messages.

pub mod config;
pub mod error;
pub mod playback;

pub use config::{PlayerConfig, SessionSettings};
pub use error::{Error, Result};
pub use playback::{
    ClipSource, CurrentlyPlaying, PlaybackFailure, PlaybackSession, SessionSnapshot,
};
