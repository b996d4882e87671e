//! Presentation bridge: serializable snapshots of the live panel.
//!
//! The application state (notification center, toast queue, link status)
//! lives behind locks and watch channels and is not directly serializable.
//! [`PanelSnapshot`] is a plain DTO captured from it, suitable for a JSON
//! consumer or for [`render_text`], which the binary prints to the terminal.
//!
//! # DTO shape
//!
//! ```json
//! {
//!   "status": "live",
//!   "status_text": "Live updates active",
//!   "retry_count": 0,
//!   "max_retries": 5,
//!   "notifications": [{ "id": "…", "kind": "high-score", "icon": "🎉", "title": "…", "message": "…", "ttl_ms": 7000 }],
//!   "toasts": [{ "id": "…", "severity": "success", "icon": "✅", "title": "…", "message": "…", "phase": "visible", "sticky": false }]
//! }
//! ```

use std::fmt::Write as _;

use scoreline_core::{
    NotificationId, NotificationKind, NotificationRecord, ToastId, ToastPhase, ToastRecord,
    ToastSeverity,
};
use serde::Serialize;

use crate::application::{NotificationCenter, ToastQueue};
use crate::infrastructure::transport::{ConnectionState, LinkStatus};

// ── Live status ───────────────────────────────────────────────────────────────

/// What the status indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveStatus {
    /// The link is open.
    Live,
    /// Not open yet, or between reconnect attempts.
    Connecting,
    /// Reconnect attempts are exhausted.
    NotLive,
}

impl LiveStatus {
    pub fn text(self) -> &'static str {
        match self {
            Self::Live => "Live updates active",
            Self::Connecting => "Connecting...",
            Self::NotLive => "Live updates unavailable",
        }
    }
}

impl From<&LinkStatus> for LiveStatus {
    fn from(status: &LinkStatus) -> Self {
        match status.state {
            ConnectionState::Open => Self::Live,
            _ if status.exhausted => Self::NotLive,
            _ => Self::Connecting,
        }
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDto {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub icon: &'static str,
    pub title: String,
    pub message: String,
    pub ttl_ms: u64,
}

impl From<NotificationRecord> for NotificationDto {
    fn from(r: NotificationRecord) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            icon: r.kind.icon(),
            ttl_ms: r.ttl.as_millis() as u64,
            title: r.title,
            message: r.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastDto {
    pub id: ToastId,
    pub severity: ToastSeverity,
    pub icon: &'static str,
    pub title: String,
    pub message: String,
    pub phase: ToastPhase,
    /// `true` for toasts that only close manually.
    pub sticky: bool,
}

impl From<ToastRecord> for ToastDto {
    fn from(r: ToastRecord) -> Self {
        Self {
            id: r.id,
            severity: r.severity,
            icon: r.severity.icon(),
            sticky: r.is_sticky(),
            phase: r.phase,
            title: r.title,
            message: r.message,
        }
    }
}

/// Everything the live panel displays, at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelSnapshot {
    pub status: LiveStatus,
    pub status_text: &'static str,
    pub retry_count: u32,
    pub max_retries: u32,
    pub notifications: Vec<NotificationDto>,
    pub toasts: Vec<ToastDto>,
}

impl PanelSnapshot {
    /// Reads the current state of the three live sources.
    pub fn capture(link: &LinkStatus, notifications: &NotificationCenter, toasts: &ToastQueue) -> Self {
        Self::from_parts(link, notifications.snapshot(), toasts.snapshot())
    }

    pub fn from_parts(
        link: &LinkStatus,
        notifications: Vec<NotificationRecord>,
        toasts: Vec<ToastRecord>,
    ) -> Self {
        let status = LiveStatus::from(link);
        Self {
            status,
            status_text: status.text(),
            retry_count: link.retry_count,
            max_retries: link.max_retries,
            notifications: notifications.into_iter().map(Into::into).collect(),
            toasts: toasts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Renders `snapshot` as the plain-text panel printed by the binary.
pub fn render_text(snapshot: &PanelSnapshot) -> String {
    let mut out = String::new();

    let _ = write!(out, "[{}]", snapshot.status_text);
    if snapshot.status != LiveStatus::Live && snapshot.retry_count > 0 {
        let _ = write!(out, " (retry {}/{})", snapshot.retry_count, snapshot.max_retries);
    }
    out.push('\n');

    if snapshot.notifications.is_empty() {
        out.push_str("  no notifications\n");
    }
    for n in &snapshot.notifications {
        let _ = writeln!(out, "  {} {}: {}", n.icon, n.title, n.message);
    }

    for t in &snapshot.toasts {
        let phase = match t.phase {
            ToastPhase::Entering => "entering",
            ToastPhase::Visible => "visible",
            ToastPhase::Leaving => "leaving",
        };
        let _ = writeln!(out, "  {} [{phase}] {}: {}", t.icon, t.title, t.message);
    }

    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
