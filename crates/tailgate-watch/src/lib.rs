//! tailgate-watch — filesystem watcher sources for tailgate.
//!
//! A watcher subscribes to a directory and pushes [`WatchMessage`]s onto an
//! unbounded channel owned by the engine: a `Change` for every path that
//! changed, and a single `Stop` once the watcher can no longer report
//! anything. The engine never inspects the backend; it only sees messages.

pub mod manual;
pub mod native;

pub use manual::ManualWatcher;
pub use native::NotifyWatcher;

use std::any::Any;
use std::path::{Path, PathBuf};
use tailgate_core::{WatchMessage, WatcherId};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Implemented by each watcher backend.
pub trait WatchSource: Send {
    /// Start watching `directory` (non-recursively), sending messages to
    /// `events` until the returned [`Subscription`] is dropped.
    fn subscribe(
        &mut self,
        directory: &Path,
        events: UnboundedSender<WatchMessage>,
    ) -> Result<Subscription, WatchError>;
}

/// A live watch. Dropping it tears the backend watch down.
pub struct Subscription {
    id: WatcherId,
    _guard: Box<dyn Any + Send>,
}

impl Subscription {
    pub fn new(id: WatcherId, guard: impl Any + Send) -> Self {
        Self {
            id,
            _guard: Box::new(guard),
        }
    }

    pub fn id(&self) -> WatcherId {
        self.id
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to initialise filesystem watcher: {0}")]
    Init(#[source] ::notify::Error),

    #[error("failed to watch {}: {source}", path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: ::notify::Error,
    },
}
