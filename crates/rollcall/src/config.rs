//! Engine configuration with TOML file support.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rollcall_core::TemporalGatePolicy;
use rollcall_store::{SqliteStore, StoreError};

use crate::logging::LogFormat;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a [`VerificationEngine`](crate::VerificationEngine).
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// What to do when an action's event day cannot be resolved.
    #[serde(default)]
    pub temporal_gate: TemporalGatePolicy,

    /// Offset from UTC, in seconds, of the venue's local time. Defines "today".
    #[serde(default)]
    pub utc_offset_seconds: i32,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directive, e.g. `"info"` or `"debug,rollcall_store=trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file. In-memory SQLite when unset.
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temporal_gate: TemporalGatePolicy::default(),
            utc_offset_seconds: 0,
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.offset().map(|_| ())
    }

    /// The venue's UTC offset.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_seconds).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_seconds out of range: {}",
                self.utc_offset_seconds
            ))
        })
    }

    /// Open the configured SQLite store.
    pub fn open_store(&self) -> Result<SqliteStore, StoreError> {
        match &self.store.sqlite_path {
            Some(path) => SqliteStore::open(path),
            None => SqliteStore::open_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.temporal_gate, TemporalGatePolicy::FailOpen);
        assert_eq!(config.logging.level, "info");
        assert!(config.store.sqlite_path.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            temporal_gate = "fail_closed"
            utc_offset_seconds = 25200

            [logging]
            format = "json"

            [store]
            sqlite_path = "/var/lib/rollcall/rollcall.db"
        "#;
        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.temporal_gate, TemporalGatePolicy::FailClosed);
        assert_eq!(config.offset().unwrap().local_minus_utc(), 25200);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.store.sqlite_path,
            Some(PathBuf::from("/var/lib/rollcall/rollcall.db"))
        );
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        let err = EngineConfig::from_toml_str("utc_offset_seconds = 90000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = EngineConfig::from_toml_str(r#"temporal_gate = "maybe""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.toml");
        std::fs::write(&path, "utc_offset_seconds = -18000\n").unwrap();
        let config = EngineConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.utc_offset_seconds, -18000);
    }
}
