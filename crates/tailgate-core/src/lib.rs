//! tailgate-core — shared types and configuration for tailgate.
//!
//! # Architecture
//!
//! ```text
//! Watcher / Timer ──► Engine (offset reader) ──► Dispatcher ──► Sink
//! ```
//!
//! The watcher crate and the engine both speak the types defined here; the
//! engine owns the only mutable state.

pub mod config;
pub mod error;
pub mod types;

pub use config::{LogConfig, TailConfig, Trigger};
pub use error::ConfigError;
pub use types::{
    ChangeKind, FsChange, Mode, Payload, TailMessage, TimerId, WatchMessage, WatcherId,
    WatcherStopped, MESSAGE_TAG, STDOUT_LABEL,
};
