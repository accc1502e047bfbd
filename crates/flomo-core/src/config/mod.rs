//! Runtime configuration.
//!
//! `SyncOptions` tunes a single sync run. `AppConfig` is the on-disk JSON file
//! clients use to locate the database and the note export.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Plugin identity used to scope persisted state
pub const DEFAULT_PLUGIN: &str = "flomo";

/// How long to wait for the source to settle after opening a session
pub const DEFAULT_READY_DELAY: Duration = Duration::from_millis(1000);

/// Options for a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Identity under which the cursor is persisted
    pub plugin: String,
    /// Fixed wait between opening the session and reading notes
    pub ready_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            plugin: DEFAULT_PLUGIN.to_string(),
            ready_delay: DEFAULT_READY_DELAY,
        }
    }
}

impl SyncOptions {
    /// Set the plugin identity
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = plugin.into();
        self
    }

    /// Set the readiness delay
    #[must_use]
    pub const fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }
}

/// Client configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Path of the `SQLite` database holding the block graph
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Directory containing the note export
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// Plugin identity override
    #[serde(default)]
    pub plugin: Option<String>,
    /// Readiness delay override, in milliseconds
    #[serde(default)]
    pub ready_delay_ms: Option<u64>,
}

impl AppConfig {
    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    /// Parse a config payload
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))
    }

    /// Sync options derived from this config
    #[must_use]
    pub fn sync_options(&self) -> SyncOptions {
        let mut options = SyncOptions::default();
        if let Some(plugin) = normalize_text_option(self.plugin.clone()) {
            options = options.with_plugin(plugin);
        }
        if let Some(delay) = self.ready_delay_ms {
            options = options.with_ready_delay(Duration::from_millis(delay));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = AppConfig::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.sync_options(), SyncOptions::default());
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let error = AppConfig::parse(r#"{"database_path": "a.db", "extra": 1}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn sync_options_apply_overrides() {
        let config =
            AppConfig::parse(r#"{"plugin": " flomo-work ", "ready_delay_ms": 0}"#).unwrap();
        let options = config.sync_options();
        assert_eq!(options.plugin, "flomo-work");
        assert_eq!(options.ready_delay, Duration::ZERO);
    }

    #[test]
    fn blank_plugin_keeps_default() {
        let config = AppConfig::parse(r#"{"plugin": "  "}"#).unwrap();
        assert_eq!(config.sync_options().plugin, DEFAULT_PLUGIN);
    }
}
