//! Error types shared across the tailgate crates.

use thiserror::Error;

/// A configuration that cannot drive an engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("no file to tail: `path` is empty")]
    MissingPath,

    #[error("`chunk_size` must be greater than zero")]
    ZeroChunkSize,

    #[error("`poll_interval_ms` must be greater than zero")]
    ZeroPollInterval,

    /// Polling and filesystem events both enabled.
    #[error("`poll_interval_ms` and `fs_events` are mutually exclusive; set `fs_events = false` to poll")]
    ConflictingTriggers,
}
