//! Common error types for clipdeck

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for clipdeck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across clipdeck crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },
}
