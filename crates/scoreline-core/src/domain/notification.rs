//! Notification records.
//!
//! A notification is the "big" alert in the notification panel.  Unlike
//! toasts there is no cap on how many can be visible at once: each record
//! simply removes itself after its time-to-live.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a notification record.
pub type NotificationId = Uuid;

/// The kind of event a notification was created for.
///
/// The kind decides the default time-to-live and the icon the presentation
/// layer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// A player posted a high score.
    HighScore,
    /// The leaderboard has a new leader.
    NewLeader,
    /// Any other broadcast.
    General,
}

impl NotificationKind {
    /// Default time-to-live for records of this kind.
    ///
    /// | Kind         | TTL     |
    /// |--------------|---------|
    /// | `HighScore`  | 7000 ms |
    /// | `NewLeader`  | 8000 ms |
    /// | `General`    | 5000 ms |
    pub fn default_ttl(self) -> Duration {
        match self {
            Self::HighScore => Duration::from_millis(7000),
            Self::NewLeader => Duration::from_millis(8000),
            Self::General => Duration::from_millis(5000),
        }
    }

    /// Icon shown next to the record.
    pub fn icon(self) -> &'static str {
        match self {
            Self::HighScore => "🎉",
            Self::NewLeader => "👑",
            Self::General => "📢",
        }
    }

    /// Wire/CSS-style name (`"high-score"`, `"new-leader"`, `"general"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighScore => "high-score",
            Self::NewLeader => "new-leader",
            Self::General => "general",
        }
    }
}

/// One notification in the live collection.
///
/// Records are immutable once created; they leave the collection either when
/// their `ttl` elapses or when the user dismisses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Milliseconds since the Unix epoch at creation time.
    pub created_at_ms: u64,
    pub ttl: Duration,
}
