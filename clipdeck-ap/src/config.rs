//! clipdeck-ap configuration
//!
//! Loaded from a TOML file (see `clipdeck_common::config` for how the file is
//! located). Every section is optional; a missing file means built-in
//! defaults.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [session]
//! position_poll_interval_ms = 500
//! event_capacity = 100
//!
//! [[clips]]
//! id = "intro"
//! uri = "file:///media/intro.ogg"
//! duration_ms = 4200
//! ```

use clipdeck_common::config::{
    load_toml_or_default, resolve_config_path, LoggingConfig, CONFIG_ENV_VAR,
};
use clipdeck_common::ClipId;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};
use crate::playback::{ClipCatalog, ClipSource};

/// Shortest accepted poll period
const MIN_POLL_INTERVAL_MS: u64 = 20;
/// Longest accepted poll period
const MAX_POLL_INTERVAL_MS: u64 = 10_000;

/// Top-level player configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub session: SessionSettings,

    /// Clips known to the simulated resource, in default play order
    #[serde(default)]
    pub clips: Vec<ClipConfig>,
}

/// Per-session tuning
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SessionSettings {
    /// Period of position sampling while a clip plays
    ///
    /// Default: 500ms. Clamped to 20-10000ms.
    #[serde(default = "default_poll_interval_ms")]
    pub position_poll_interval_ms: u64,

    /// Events buffered per event subscriber before the oldest are dropped
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// One catalog entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClipConfig {
    pub id: ClipId,
    pub uri: String,
    pub duration_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_event_capacity() -> usize {
    100
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            position_poll_interval_ms: default_poll_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SessionSettings {
    pub fn poll_interval(&self) -> Duration {
        let clamped = self
            .position_poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        if clamped != self.position_poll_interval_ms {
            warn!(
                "position_poll_interval_ms {} out of range, using {}",
                self.position_poll_interval_ms, clamped
            );
        }
        Duration::from_millis(clamped)
    }
}

impl PlayerConfig {
    /// Locate, load and validate the config file
    ///
    /// `cli_path` takes priority over `CLIPDECK_CONFIG` and the per-user file.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR);
        let config: Self = load_toml_or_default(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for clip in &self.clips {
            if clip.id.as_str().is_empty() {
                return Err(Error::Config(format!("clip with uri {:?} has an empty id", clip.uri)));
            }
            if clip.uri.trim().is_empty() {
                return Err(Error::Config(format!("clip {} has an empty uri", clip.id)));
            }
        }
        Ok(())
    }

    /// Catalog of every configured clip for the simulated resource
    pub fn catalog(&self) -> ClipCatalog {
        let mut catalog = ClipCatalog::new();
        for clip in &self.clips {
            catalog.insert(clip.uri.clone(), clip.duration_ms);
        }
        catalog
    }

    /// Resolve clip ids to sources; an empty selection means every clip
    pub fn select_clips(&self, ids: &[String]) -> Result<Vec<ClipSource>> {
        if ids.is_empty() {
            return Ok(self.clips.iter().map(ClipConfig::source).collect());
        }

        ids.iter()
            .map(|id| {
                self.clips
                    .iter()
                    .find(|clip| clip.id.as_str() == id)
                    .map(ClipConfig::source)
                    .ok_or_else(|| Error::ClipNotFound(id.clone()))
            })
            .collect()
    }
}

impl ClipConfig {
    fn source(&self) -> ClipSource {
        ClipSource::new(self.id.clone(), self.uri.clone())
    }
}
