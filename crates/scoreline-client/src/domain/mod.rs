//! Domain layer for scoreline-client.
//!
//! Contains the runtime configuration only; the record types live in
//! `scoreline-core` because the presentation side consumes them too.
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, socket, or WebSocket types
//! - File I/O or environment variable reading (see `infrastructure::storage`)

pub mod config;

pub use config::{LiveConfig, NotificationTtls, ReconnectPolicy, ToastTimings};
