//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the optional TOML file and maps it onto the
//! domain [`crate::domain::LiveConfig`].  Command-line overrides are applied
//! afterwards by `main.rs`.

pub mod config;

pub use config::{load_config, ConfigError, ConfigFile};
