//! Error types for clipdeck-ap
//!
//! Load failures are not in this enum: they never reach the caller and are
//! published through the session's error observable instead (see
//! [`crate::playback::PlaybackFailure`]).

use thiserror::Error;

/// Main error type for clipdeck-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the shared clipdeck-common crate
    #[error(transparent)]
    Common(#[from] clipdeck_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session actor has shut down (teardown, or every handle dropped)
    #[error("Playback session is closed")]
    SessionClosed,

    /// Clip requested on the command line is not in the configured catalog
    #[error("Clip not found: {0}")]
    ClipNotFound(String),
}

/// Convenience Result type using clipdeck-ap Error
pub type Result<T> = std::result::Result<T, Error>;
