//! Payload schemas of the events the alert pipeline consumes.
//!
//! # Two shapes of score payload
//!
//! The backend publishes `high-score` and `new-leader` payloads in one of two
//! shapes, depending on whether it bundles a ready-made toast:
//!
//! ```json
//! {"user_name":"Ann","score":1500}
//! {"user_name":"Ann","score":1500,"toast":{"type":"success","title":"..","message":".."}}
//! {"data":{"user_name":"Ann","score":1500},"toast":{...}}
//! ```
//!
//! [`ScoreEvent::from_payload`] accepts all of them.  A bundled toast that
//! does not match the [`ToastRequest`] schema is ignored so the caller falls
//! back to a toast it builds itself.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::toast::ToastRequest;
use crate::domain::wire_number::{lenient_millis, Score};

/// A decoded `high-score` or `new-leader` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEvent {
    pub user_name: String,
    pub score: Score,
    /// Toast supplied by the backend, if it sent a well-formed one.
    pub toast: Option<ToastRequest>,
}

#[derive(Deserialize)]
struct ScoreFields {
    user_name: String,
    score: Score,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScorePayload {
    Nested {
        data: ScoreFields,
        #[serde(default)]
        toast: Option<Value>,
    },
    Flat {
        user_name: String,
        score: Score,
        #[serde(default)]
        toast: Option<Value>,
    },
}

impl ScoreEvent {
    /// Parses a score event from a frame payload.
    ///
    /// # Errors
    ///
    /// Returns the serde error when neither payload shape matches (missing
    /// `user_name`, non-numeric `score`, ...).
    pub fn from_payload(payload: &Value) -> Result<Self, serde_json::Error> {
        let (fields, toast) = match ScorePayload::deserialize(payload)? {
            ScorePayload::Nested { data, toast } => (data, toast),
            ScorePayload::Flat {
                user_name,
                score,
                toast,
            } => (ScoreFields { user_name, score }, toast),
        };

        let toast = toast.and_then(|raw| match ToastRequest::deserialize(&raw) {
            Ok(req) => Some(req),
            Err(e) => {
                tracing::debug!("ignoring malformed backend toast: {e}");
                None
            }
        });

        Ok(Self {
            user_name: fields.user_name,
            score: fields.score,
            toast,
        })
    }
}

/// A decoded `notification` payload.
///
/// Every field is optional; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeneralNotice {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Time-to-live in milliseconds.  Any JSON number is accepted.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub duration: Option<u64>,
}

impl GeneralNotice {
    pub const DEFAULT_TITLE: &'static str = "Notification";
    pub const DEFAULT_MESSAGE: &'static str = "You have a new notification";

    /// Parses a notice from a frame payload.  A `null` payload is an empty
    /// notice.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the payload is neither `null` nor an
    /// object with the optional fields.
    pub fn from_payload(payload: &Value) -> Result<Self, serde_json::Error> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(payload)
    }

    pub fn title(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or(Self::DEFAULT_TITLE)
    }

    pub fn message(&self) -> &str {
        non_blank(self.message.as_deref()).unwrap_or(Self::DEFAULT_MESSAGE)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
