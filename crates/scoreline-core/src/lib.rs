//! # scoreline-core
//!
//! Shared library for the Scoreline live pipeline containing the wire frame
//! codec, the action names the backend publishes, and the record types that
//! the notification center and toast queue materialize.
//!
//! It has zero dependencies on sockets, timers, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A scoreboard backend pushes small JSON *frames* over a WebSocket whenever
//! something interesting happens: somebody posts a high score, the leader
//! changes, or an operator broadcasts a message.  The client turns each frame
//! into short-lived alerts on screen.
//!
//! This crate (`scoreline-core`) is the shared vocabulary.  It defines:
//!
//! - **`protocol`** – How frames travel over the wire.  One WebSocket text
//!   message carries exactly one JSON object
//!   `{"action": ..., "connectionId": ..., "data": ...}`.
//!
//! - **`domain`** – Pure record types with no runtime dependencies: the
//!   notification and toast records, and the payload schemas of the score
//!   events.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `scoreline_core::Frame` instead of `scoreline_core::protocol::frame::Frame`.
pub use domain::notification::{NotificationId, NotificationKind, NotificationRecord};
pub use domain::score_event::{GeneralNotice, ScoreEvent};
pub use domain::toast::{ToastId, ToastPhase, ToastRecord, ToastRequest, ToastSeverity};
pub use domain::wire_number::Score;
pub use protocol::frame::{decode_frame, decode_frame_bytes, encode_frame, Frame, FrameError};
