//! Integration tests for the scoreline-core frame codec.
//!
//! These tests go through the public API only and check the property the
//! transport relies on: a frame serialized by [`encode_frame`] and parsed by
//! [`decode_frame`] comes back structurally identical, whatever its payload.

use scoreline_core::protocol::actions;
use scoreline_core::{decode_frame, decode_frame_bytes, encode_frame, Frame, FrameError, ScoreEvent};
use serde_json::{json, Value};

/// Encodes a frame and then decodes it.
fn roundtrip(frame: &Frame) -> Frame {
    let text = encode_frame(frame).expect("encode must succeed");
    decode_frame(&text).expect("decode must succeed")
}

#[test]
fn test_roundtrip_preserves_payloads_of_every_shape() {
    let payloads = [
        json!({"user_name": "Ann", "score": 1500}),
        json!([1, 2, 3]),
        json!("plain string"),
        json!(42.5),
        json!(true),
        Value::Null,
    ];

    for payload in payloads {
        let frame = Frame::new(actions::HIGH_SCORE, "conn-1").with_data(payload);
        assert_eq!(roundtrip(&frame), frame);
    }
}

#[test]
fn test_roundtrip_without_payload() {
    let frame = Frame::new("ping", "conn-1");
    assert_eq!(roundtrip(&frame), frame);
}

#[test]
fn test_roundtrip_preserves_unicode() {
    let frame = Frame::new(actions::NOTIFICATION, "c").with_data(json!({
        "title": "🎉 Félicitations",
        "message": "日本語のメッセージ"
    }));
    assert_eq!(roundtrip(&frame), frame);
}

#[test]
fn test_backend_frame_decodes_into_score_event() {
    // Arrange: the text exactly as a backend would send it
    let text = r#"{"action":"high-score","connectionId":"Zx1=","data":{"user_name":"Ann","score":1500}}"#;

    // Act
    let frame = decode_frame(text).unwrap();
    let event = ScoreEvent::from_payload(frame.payload()).unwrap();

    // Assert
    assert_eq!(frame.action, actions::HIGH_SCORE);
    assert_eq!(event.user_name, "Ann");
    assert_eq!(event.score, 1500);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let frame = decode_frame(r#"{"action":"x","connectionId":"c","extra":1}"#).unwrap();
    assert_eq!(frame, Frame::new("x", "c"));
}

#[test]
fn test_truncated_text_is_malformed() {
    let text = encode_frame(&Frame::new("x", "c")).unwrap();
    let truncated = &text[..text.len() - 3];
    assert!(matches!(decode_frame(truncated), Err(FrameError::Malformed(_))));
}

#[test]
fn test_binary_messages_decode_through_the_crate_root() {
    let text = encode_frame(&Frame::new(actions::NEW_LEADER, "c9")).unwrap();

    let frame = decode_frame_bytes(text.as_bytes()).unwrap();

    assert_eq!(frame.action, "new-leader");
    assert!(decode_frame_bytes(&[0xc3, 0x28]).is_err());
}
