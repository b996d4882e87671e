//! Client configuration types.
//!
//! [`LiveConfig`] is the single source of truth for all runtime settings.
//! It can be constructed from CLI arguments and an optional TOML file (see
//! `infrastructure::storage::config`) or from defaults (useful for local
//! development and tests).
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads in the domain) lets tests build any variant they need, e.g. a
//! 10 ms retry interval.

use std::time::Duration;

use scoreline_core::NotificationKind;

/// Fixed-interval, bounded reconnect policy for the live transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay between a drop and the next automatic attempt.
    pub interval: Duration,
    /// Automatic attempts allowed before the transport gives up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_attempts: 5,
        }
    }
}

/// Timing of the toast lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTimings {
    /// Entering → Visible delay.
    pub settle: Duration,
    /// Leaving → removed delay (lets the exit transition be observed).
    pub exit: Duration,
    /// Time-to-live of a toast whose request carries no duration.
    pub default_ttl: Duration,
}

impl Default for ToastTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(50),
            exit: Duration::from_millis(300),
            default_ttl: Duration::from_millis(5000),
        }
    }
}

/// Default time-to-live of notification records, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTtls {
    pub general: Duration,
    pub high_score: Duration,
    pub new_leader: Duration,
}

impl NotificationTtls {
    /// Returns the default time-to-live for `kind`.
    pub fn for_kind(&self, kind: NotificationKind) -> Duration {
        match kind {
            NotificationKind::General => self.general,
            NotificationKind::HighScore => self.high_score,
            NotificationKind::NewLeader => self.new_leader,
        }
    }
}

impl Default for NotificationTtls {
    fn default() -> Self {
        Self {
            general: NotificationKind::General.default_ttl(),
            high_score: NotificationKind::HighScore.default_ttl(),
            new_leader: NotificationKind::NewLeader.default_ttl(),
        }
    }
}

/// All runtime configuration for the live client.
///
/// # Example
///
/// ```rust
/// use scoreline_client::domain::LiveConfig;
///
/// let cfg = LiveConfig::default();
/// assert_eq!(cfg.toast_capacity, 5);
/// assert_eq!(cfg.reconnect.max_attempts, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    /// WebSocket endpoint of the scoreboard backend (`ws://` or `wss://`).
    pub ws_url: String,
    pub reconnect: ReconnectPolicy,
    /// Maximum number of toasts alive at once.
    pub toast_capacity: usize,
    pub toast: ToastTimings,
    pub notification_ttls: NotificationTtls,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for LiveConfig {
    /// | Field                     | Default                  |
    /// |---------------------------|--------------------------|
    /// | ws_url                    | `ws://127.0.0.1:3001`    |
    /// | reconnect.interval        | 5 seconds                |
    /// | reconnect.max_attempts    | 5                        |
    /// | toast_capacity            | 5                        |
    /// | toast settle / exit / ttl | 50 ms / 300 ms / 5000 ms |
    /// | notification ttls         | 5000 / 7000 / 8000 ms    |
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:3001".to_string(),
            reconnect: ReconnectPolicy::default(),
            toast_capacity: 5,
            toast: ToastTimings::default(),
            notification_ttls: NotificationTtls::default(),
            log_level: "info".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
