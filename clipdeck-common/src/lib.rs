//! # clipdeck Common Library
//!
//! Shared code for the clipdeck crates:
//! - Clip identifiers
//! - Event types (ClipdeckEvent enum) and EventBus
//! - Configuration file resolution and TOML loading
//! - Common error type

pub mod clip;
pub mod config;
pub mod error;
pub mod events;

pub use clip::ClipId;
pub use error::{Error, Result};
