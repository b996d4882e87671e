//! Domain entities for the Scoreline live pipeline.
//!
//! This module contains pure data types with no runtime dependencies: no
//! timers, no sockets, no locks.  The application layer of
//! `scoreline-client` owns the *lifecycles* of these records (expiry,
//! eviction, phase transitions); the types here only describe what a record
//! is and how an event payload is shaped.

/// Notification records and their per-kind default time-to-live.
pub mod notification;

/// Payload schemas of the score events (`high-score`, `new-leader`,
/// `notification`).
pub mod score_event;

/// Toast requests, records, and lifecycle phases.
pub mod toast;

/// Lenient JSON numbers: scores and millisecond durations.
pub mod wire_number;
