//! TOML configuration file for the live client.
//!
//! The file is optional.  Every field has a default, so a file only needs to
//! mention what it changes:
//!
//! ```toml
//! [connection]
//! url = "wss://scores.example.com/live"
//! retry_interval_ms = 2000
//!
//! [toasts]
//! capacity = 3
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when the key is absent, and whole sections fall back to their
//! `Default` impl through `#[serde(default)]`.  A missing file behaves like
//! an empty one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{LiveConfig, NotificationTtls, ReconnectPolicy, ToastTimings};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub toasts: ToastSection,
    #[serde(default)]
    pub notifications: NotificationSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    /// WebSocket endpoint (`ws://` or `wss://`).
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToastSection {
    #[serde(default = "default_toast_capacity")]
    pub capacity: usize,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_exit_ms")]
    pub exit_ms: u64,
    /// Time-to-live of toasts that do not carry their own duration.
    #[serde(default = "default_toast_ttl_ms")]
    pub default_ttl_ms: u64,
}

/// Default notification lifetimes, per kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NotificationSection {
    #[serde(default = "default_general_ms")]
    pub general_ms: u64,
    #[serde(default = "default_high_score_ms")]
    pub high_score_ms: u64,
    #[serde(default = "default_new_leader_ms")]
    pub new_leader_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_url() -> String {
    LiveConfig::default().ws_url
}
fn default_retry_interval_ms() -> u64 {
    ReconnectPolicy::default().interval.as_millis() as u64
}
fn default_max_retries() -> u32 {
    ReconnectPolicy::default().max_attempts
}
fn default_toast_capacity() -> usize {
    LiveConfig::default().toast_capacity
}
fn default_settle_ms() -> u64 {
    ToastTimings::default().settle.as_millis() as u64
}
fn default_exit_ms() -> u64 {
    ToastTimings::default().exit.as_millis() as u64
}
fn default_toast_ttl_ms() -> u64 {
    ToastTimings::default().default_ttl.as_millis() as u64
}
fn default_general_ms() -> u64 {
    NotificationTtls::default().general.as_millis() as u64
}
fn default_high_score_ms() -> u64 {
    NotificationTtls::default().high_score.as_millis() as u64
}
fn default_new_leader_ms() -> u64 {
    NotificationTtls::default().new_leader.as_millis() as u64
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            retry_interval_ms: default_retry_interval_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ToastSection {
    fn default() -> Self {
        Self {
            capacity: default_toast_capacity(),
            settle_ms: default_settle_ms(),
            exit_ms: default_exit_ms(),
            default_ttl_ms: default_toast_ttl_ms(),
        }
    }
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            general_ms: default_general_ms(),
            high_score_ms: default_high_score_ms(),
            new_leader_ms: default_new_leader_ms(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl From<ConfigFile> for LiveConfig {
    fn from(file: ConfigFile) -> Self {
        let ms = Duration::from_millis;
        Self {
            ws_url: file.connection.url,
            reconnect: ReconnectPolicy {
                interval: ms(file.connection.retry_interval_ms),
                max_attempts: file.connection.max_retries,
            },
            toast_capacity: file.toasts.capacity,
            toast: ToastTimings {
                settle: ms(file.toasts.settle_ms),
                exit: ms(file.toasts.exit_ms),
                default_ttl: ms(file.toasts.default_ttl_ms),
            },
            notification_ttls: NotificationTtls {
                general: ms(file.notifications.general_ms),
                high_score: ms(file.notifications.high_score_ms),
                new_leader: ms(file.notifications.new_leader_ms),
            },
            log_level: file.logging.level,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the config file at `path`, returning defaults if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config file at {}, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_maps_to_default_live_config() {
        // Arrange / Act
        let cfg: LiveConfig = ConfigFile::default().into();

        // Assert
        assert_eq!(cfg, LiveConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let text = r#"
            [connection]
            url = "wss://scores.example.com/live"

            [toasts]
            capacity = 3
        "#;

        // Act
        let cfg: LiveConfig = toml::from_str::<ConfigFile>(text).unwrap().into();

        // Assert
        assert_eq!(cfg.ws_url, "wss://scores.example.com/live");
        assert_eq!(cfg.toast_capacity, 3);
        assert_eq!(cfg.reconnect, ReconnectPolicy::default());
        assert_eq!(cfg.toast.settle, Duration::from_millis(50));
    }

    #[test]
    fn test_millisecond_fields_become_durations() {
        let text = r#"
            [connection]
            retry_interval_ms = 250
            max_retries = 9

            [notifications]
            high_score_ms = 1000
        "#;

        let cfg: LiveConfig = toml::from_str::<ConfigFile>(text).unwrap().into();

        assert_eq!(cfg.reconnect.interval, Duration::from_millis(250));
        assert_eq!(cfg.reconnect.max_attempts, 9);
        assert_eq!(cfg.notification_ttls.high_score, Duration::from_millis(1000));
        assert_eq!(cfg.notification_ttls.new_leader, Duration::from_millis(8000));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let result = toml::from_str::<ConfigFile>("[display]\nwidth = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_inside_section_is_rejected() {
        let result = toml::from_str::<ConfigFile>("[connection]\nurll = \"ws://x\"\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("urll"), "unexpected error: {err}");
    }

    #[test]
    fn test_unknown_key_in_every_section_is_rejected() {
        for section in ["connection", "toasts", "notifications", "logging"] {
            let text = format!("[{section}]\nbogus = 1\n");
            assert!(toml::from_str::<ConfigFile>(&text).is_err(), "[{section}] accepted bogus");
        }
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join(format!("scoreline-missing-{}.toml", uuid::Uuid::new_v4()));

        let file = tokio_test::assert_ok!(load_config(&path));

        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!("scoreline-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        // Act
        let file = load_config(&path);
        std::fs::remove_file(&path).ok();

        // Assert
        let file = tokio_test::assert_ok!(file);
        assert_eq!(file.logging.level, "debug");
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("scoreline-bad-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[connection\nurl = ").unwrap();

        let result = load_config(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut file = ConfigFile::default();
        file.toasts.capacity = 8;

        let text = toml::to_string_pretty(&file).unwrap();
        let restored: ConfigFile = toml::from_str(&text).unwrap();

        assert_eq!(file, restored);
    }
}
