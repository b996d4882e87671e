//! Infrastructure layer for the live client.
//!
//! Contains the adapters to the outside world: the WebSocket link, the
//! config file, the refresh port and the presentation bridge.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain`
//! and `scoreline_core`, but MUST NOT be imported by them.
//!
//! # Sub-modules
//!
//! - **`transport`** – WebSocket client with bounded fixed-interval reconnects.
//!   Decodes inbound frames and hands them to the `EventRouter`.
//!
//! - **`storage`** – Optional TOML config file, mapped onto `LiveConfig`.
//!
//! - **`refresh`** – `LeaderboardRefresher` adapters: a channel-backed one for
//!   the binary and a recording `MockRefresher` for tests.
//!
//! - **`ui_bridge`** – Serializable `PanelSnapshot` DTOs and the text renderer.

pub mod refresh;
pub mod storage;
pub mod transport;
pub mod ui_bridge;
