//! Toast requests and records.
//!
//! A toast is a small transient message in the corner of the screen.  The
//! toast queue in `scoreline-client` caps how many are alive at once and
//! drives each record through its phases:
//!
//! ```text
//! push ──> Entering ──(settle)──> Visible ──(ttl or close)──> Leaving ──(exit)──> removed
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a toast record.
pub type ToastId = Uuid;

/// Visual severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastSeverity {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastSeverity {
    /// Icon shown next to the toast.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Warning => "⚠️",
            Self::Info => "ℹ️",
        }
    }
}

/// A request to show a toast.
///
/// This is also the schema of the ready-made toast the backend may bundle
/// with a score event:
///
/// ```json
/// {"type":"success","title":"Nice!","message":"Ann scored 1500","duration":6000}
/// ```
///
/// `duration` is in milliseconds.  When absent the queue applies its default
/// time-to-live; an explicit `0` keeps the toast until it is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastRequest {
    #[serde(rename = "type")]
    pub severity: ToastSeverity,
    pub title: String,
    pub message: String,
    #[serde(
        rename = "duration",
        default,
        deserialize_with = "crate::domain::wire_number::lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
}

impl ToastRequest {
    /// Creates a request that uses the queue's default time-to-live.
    pub fn new(severity: ToastSeverity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            duration_ms: None,
        }
    }

    /// Sets an explicit time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.duration_ms = Some(ttl.as_millis() as u64);
        self
    }

    /// Resolves the effective time-to-live against the queue default.
    ///
    /// `Duration::ZERO` means "never auto-close".
    pub fn ttl_or(&self, default: Duration) -> Duration {
        self.duration_ms.map(Duration::from_millis).unwrap_or(default)
    }
}

/// Lifecycle phase of a live toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastPhase {
    /// Just pushed; the entrance transition has not settled yet.
    Entering,
    /// Fully shown.
    Visible,
    /// Closing; the record is removed once the exit transition has run.
    Leaving,
}

/// One toast in the bounded queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastRecord {
    pub id: ToastId,
    pub severity: ToastSeverity,
    pub title: String,
    pub message: String,
    /// Time-to-live measured from the push; `Duration::ZERO` never expires.
    pub ttl: Duration,
    pub phase: ToastPhase,
}

impl ToastRecord {
    /// Whether the record stays until it is closed manually.
    pub fn is_sticky(&self) -> bool {
        self.ttl.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_backend_schema() {
        // Arrange
        let json = r#"{"type":"warning","title":"T","message":"M","duration":7000}"#;

        // Act
        let req: ToastRequest = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(req.severity, ToastSeverity::Warning);
        assert_eq!(req.title, "T");
        assert_eq!(req.duration_ms, Some(7000));
    }

    #[test]
    fn test_request_accepts_float_duration() {
        let json = r#"{"type":"info","title":"T","message":"M","duration":6000.0}"#;
        let req: ToastRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.duration_ms, Some(6000));
    }

    #[test]
    fn test_request_without_duration_uses_default_ttl() {
        let req = ToastRequest::new(ToastSeverity::Info, "t", "m");
        assert_eq!(req.ttl_or(Duration::from_millis(5000)), Duration::from_millis(5000));
    }

    #[test]
    fn test_request_with_zero_duration_is_sticky() {
        let req = ToastRequest::new(ToastSeverity::Info, "t", "m").with_ttl(Duration::ZERO);
        assert_eq!(req.ttl_or(Duration::from_millis(5000)), Duration::ZERO);
    }

    #[test]
    fn test_unknown_severity_is_rejected() {
        let json = r#"{"type":"fatal","title":"T","message":"M"}"#;
        assert!(serde_json::from_str::<ToastRequest>(json).is_err());
    }

    #[test]
    fn test_request_serializes_severity_as_type() {
        let req = ToastRequest::new(ToastSeverity::Success, "t", "m");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""type":"success""#));
        assert!(!json.contains("duration"));
    }
}
