//! Unit tests for config file resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CLIPDECK_CONFIG are marked with #[serial].

use clipdeck_common::config::{
    load_toml, load_toml_or_default, resolve_config_path, LoggingConfig, CONFIG_ENV_VAR,
};
use clipdeck_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Default, Deserialize, PartialEq)]
struct SampleConfig {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    name: Option<String>,
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/clipdeck-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/clipdeck-cli.toml")), CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/clipdeck-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/clipdeck-env.toml");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/clipdeck-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_ne!(resolved, Some(PathBuf::from("")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_yields_defaults() {
    let config: SampleConfig =
        load_toml_or_default(Some(Path::new("/nonexistent/clipdeck/config.toml")))
            .expect("Missing config must not be fatal");
    assert_eq!(config, SampleConfig::default());
    assert_eq!(config.logging.level, "info");

    let config: SampleConfig = load_toml_or_default(None).unwrap();
    assert_eq!(config, SampleConfig::default());
}

#[test]
fn test_valid_file_is_parsed() {
    let file = write_config(
        r#"
        name = "demo"

        [logging]
        level = "debug"
        "#,
    );

    let config: SampleConfig = load_toml(file.path()).unwrap();
    assert_eq!(config.name.as_deref(), Some("demo"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_config("name = [unterminated");

    let result: Result<SampleConfig, Error> = load_toml_or_default(Some(file.path()));
    match result {
        Err(Error::Config { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("Expected Config error, got {:?}", other),
    }
}
