//! JSON codec for Scoreline wire frames.
//!
//! Wire format (one WebSocket text message = one frame, no chunking):
//! ```text
//! {"action": "<name>", "connectionId": "<id>", "data": <any JSON value>}
//! ```
//! `data` is optional.  Its shape depends on the action and is opaque to the
//! codec and to the router; the subscriber that handles the action parses it.
//!
//! # Present-null versus absent
//!
//! serde normally collapses `"data": null` and a missing `data` key into the
//! same `None`.  That would break the property that a frame survives an
//! encode → decode cycle unchanged, so `data` is decoded with
//! [`deserialize_present`]: a missing key is `None`, an explicit `null` is
//! `Some(Value::Null)`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The text is not a JSON object with the frame fields.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame has an empty `action`, so it cannot be routed.
    #[error("frame has an empty action")]
    MissingAction,

    /// A binary WebSocket message that is not UTF-8 text.
    #[error("binary frame is not valid UTF-8 ({0} bytes)")]
    NotText(usize),
}

/// One complete inbound or outbound transport message.
///
/// # Serde representation
///
/// ```json
/// {"action":"high-score","connectionId":"abc=","data":{"user_name":"Ann","score":1500}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Routing discriminator, e.g. `"high-score"`.
    pub action: String,

    /// Identifier the backend assigned to the socket that produced the frame.
    ///
    /// Some backends omit it on broadcast frames; it then decodes as an
    /// empty string.
    #[serde(rename = "connectionId", default)]
    pub connection_id: String,

    /// Action-specific payload.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
}

impl Frame {
    /// Creates a frame without a payload.
    pub fn new(action: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            connection_id: connection_id.into(),
            data: None,
        }
    }

    /// Attaches a payload, replacing any previous one.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the payload, or JSON `null` when the frame carries none.
    ///
    /// Handlers always receive a value so they never need to special-case a
    /// missing `data` key.
    pub fn payload(&self) -> &Value {
        self.data.as_ref().unwrap_or(&Value::Null)
    }
}

/// Maps a present `data` key (including `null`) to `Some`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Frame`] into the JSON text sent over the WebSocket.
///
/// # Errors
///
/// Returns [`FrameError::MissingAction`] for a frame with an empty action,
/// and [`FrameError::Malformed`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use scoreline_core::protocol::{decode_frame, encode_frame, Frame};
///
/// let frame = Frame::new("ping", "c-1");
/// let text = encode_frame(&frame).unwrap();
/// assert_eq!(decode_frame(&text).unwrap(), frame);
/// ```
pub fn encode_frame(frame: &Frame) -> Result<String, FrameError> {
    if frame.action.is_empty() {
        return Err(FrameError::MissingAction);
    }
    Ok(serde_json::to_string(frame)?)
}

/// Decodes one WebSocket text message into a [`Frame`].
///
/// # Errors
///
/// Returns [`FrameError::Malformed`] when the text is not a JSON object with
/// a string `action`, and [`FrameError::MissingAction`] when `action` is
/// empty.
pub fn decode_frame(text: &str) -> Result<Frame, FrameError> {
    let frame: Frame = serde_json::from_str(text)?;
    if frame.action.is_empty() {
        return Err(FrameError::MissingAction);
    }
    tracing::trace!("decoded frame for action {}", frame.action);
    Ok(frame)
}

/// Decodes a binary WebSocket message that carries UTF-8 JSON.
///
/// # Errors
///
/// Returns [`FrameError::NotText`] if the bytes are not UTF-8, otherwise the
/// same errors as [`decode_frame`].
pub fn decode_frame_bytes(bytes: &[u8]) -> Result<Frame, FrameError> {
    let text = std::str::from_utf8(bytes).map_err(|_| FrameError::NotText(bytes.len()))?;
    decode_frame(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_frame() {
        // Arrange
        let text = r#"{"action":"high-score","connectionId":"c1","data":{"score":10}}"#;

        // Act
        let frame = decode_frame(text).unwrap();

        // Assert
        assert_eq!(frame.action, "high-score");
        assert_eq!(frame.connection_id, "c1");
        assert_eq!(frame.data, Some(json!({"score": 10})));
    }

    #[test]
    fn test_decode_without_data_yields_none() {
        let frame = decode_frame(r#"{"action":"x","connectionId":"c"}"#).unwrap();
        assert_eq!(frame.data, None);
        assert_eq!(frame.payload(), &Value::Null);
    }

    #[test]
    fn test_decode_explicit_null_data_is_present() {
        // An explicit null must not collapse into "absent".
        let frame = decode_frame(r#"{"action":"x","connectionId":"c","data":null}"#).unwrap();
        assert_eq!(frame.data, Some(Value::Null));
    }

    #[test]
    fn test_decode_missing_connection_id_defaults_to_empty() {
        let frame = decode_frame(r#"{"action":"x"}"#).unwrap();
        assert_eq!(frame.connection_id, "");
    }

    #[test]
    fn test_decode_missing_action_is_malformed() {
        let result = decode_frame(r#"{"connectionId":"c","data":1}"#);
        assert!(matches!(result, Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_decode_empty_action_is_rejected() {
        let result = decode_frame(r#"{"action":"","connectionId":"c"}"#);
        assert!(matches!(result, Err(FrameError::MissingAction)));
    }

    #[test]
    fn test_decode_non_json_is_malformed() {
        assert!(matches!(
            decode_frame("not json at all"),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_non_string_action_is_malformed() {
        assert!(matches!(
            decode_frame(r#"{"action":42,"connectionId":"c"}"#),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_encode_omits_absent_data() {
        let text = encode_frame(&Frame::new("ping", "c")).unwrap();
        assert!(!text.contains("data"), "absent data must not be serialized: {text}");
        assert!(text.contains(r#""connectionId":"c""#));
    }

    #[test]
    fn test_encode_rejects_empty_action() {
        assert!(matches!(
            encode_frame(&Frame::new("", "c")),
            Err(FrameError::MissingAction)
        ));
    }

    #[test]
    fn test_decode_frame_bytes_rejects_invalid_utf8() {
        let result = decode_frame_bytes(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(FrameError::NotText(3))));
    }

    #[test]
    fn test_decode_frame_bytes_accepts_utf8_json() {
        let frame = decode_frame_bytes(br#"{"action":"x","connectionId":"c"}"#).unwrap();
        assert_eq!(frame.action, "x");
    }
}
