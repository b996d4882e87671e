//! scoreline-client library crate.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Scoreboard backend (JSON frames over WebSocket)
//!         ↓
//! [scoreline-client]
//!   ├── domain/            LiveConfig and its defaults
//!   ├── application/
//!   │     ├── event_router        action → ordered handlers, isolated fan-out
//!   │     ├── subscription_scope  registrations bound to a consumer's lifetime
//!   │     ├── notification_center self-expiring notification records
//!   │     ├── toast_queue         bounded toasts with timed phases
//!   │     └── score_alerts        turns score events into alerts + side effects
//!   └── infrastructure/
//!         ├── transport/   WebSocket connection with bounded reconnects
//!         ├── storage/     TOML config file
//!         ├── refresh/     leaderboard refresh port adapters
//!         └── ui_bridge/   snapshot DTOs and the terminal view
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` spawns timers on the Tokio runtime but never touches a
//!   socket.
//! - `infrastructure` depends on all other layers.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: routing, scopes, and the two alert collections.
pub mod application;

/// Infrastructure layer: transport, config file, adapters, presentation.
pub mod infrastructure;
