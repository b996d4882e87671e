//! Protocol module containing the wire frame and the action names.

pub mod actions;
pub mod frame;

pub use frame::{decode_frame, decode_frame_bytes, encode_frame, Frame, FrameError};
