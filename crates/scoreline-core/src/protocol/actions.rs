//! Action names published by the scoreboard backend.
//!
//! The `action` field of a [`crate::Frame`] is the routing key.  The backend
//! may publish other actions too; the router silently discards any action no
//! one has subscribed to.

/// A player posted a score that qualifies as a high score.
pub const HIGH_SCORE: &str = "high-score";

/// The top entry of the leaderboard changed hands.
pub const NEW_LEADER: &str = "new-leader";

/// A free-form broadcast (`{title, message, duration}`).
pub const NOTIFICATION: &str = "notification";

/// All actions the alert pipeline consumes, in subscription order.
pub const ALERT_ACTIONS: [&str; 3] = [HIGH_SCORE, NEW_LEADER, NOTIFICATION];
