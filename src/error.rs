//! Engine-level errors.

use std::io;
use std::path::PathBuf;
use tailgate_core::ConfigError;
use tailgate_watch::WatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TailError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The file could not be opened at construction; the engine never started.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Fatal: the engine stopped rather than continue from an uncertain offset.
    #[error("read of {} failed at offset {offset}: {source}", path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("engine is no longer running")]
    Closed,

    #[error("engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
