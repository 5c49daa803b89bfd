//! Channel-driven watcher for embedding harnesses and tests.
//!
//! A [`ManualWatcher`] is a cloneable handle: give one clone to the engine
//! and keep another to inject changes and the stop signal by hand.

use crate::{Subscription, WatchError, WatchSource};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tailgate_core::{ChangeKind, FsChange, WatchMessage, WatcherId, WatcherStopped};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Default)]
pub struct ManualWatcher {
    feed: Arc<Mutex<Option<Feed>>>,
}

#[derive(Debug)]
struct Feed {
    id: WatcherId,
    directory: PathBuf,
    events: UnboundedSender<WatchMessage>,
}

impl ManualWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the current subscription, if anything has subscribed.
    pub fn watcher_id(&self) -> Option<WatcherId> {
        self.with_feed(|feed| feed.id)
    }

    /// Directory the current subscription asked for.
    pub fn directory(&self) -> Option<PathBuf> {
        self.with_feed(|feed| feed.directory.clone())
    }

    /// Report a change at `path`. Returns `false` if nobody is subscribed or
    /// the subscriber has gone away.
    pub fn change(&self, path: impl Into<PathBuf>, kind: ChangeKind) -> bool {
        let path = path.into();
        self.with_feed(|feed| {
            feed.events
                .send(WatchMessage::Change(FsChange {
                    watcher: feed.id,
                    path,
                    kind,
                }))
                .is_ok()
        })
        .unwrap_or(false)
    }

    /// Emit the stop signal and detach the subscriber.
    pub fn stop(&self) -> bool {
        let feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner).take();
        feed.map(|feed| {
            feed.events
                .send(WatchMessage::Stop(WatcherStopped { watcher: feed.id }))
                .is_ok()
        })
        .unwrap_or(false)
    }

    fn with_feed<T>(&self, f: impl FnOnce(&Feed) -> T) -> Option<T> {
        self.feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl WatchSource for ManualWatcher {
    fn subscribe(
        &mut self,
        directory: &Path,
        events: UnboundedSender<WatchMessage>,
    ) -> Result<Subscription, WatchError> {
        let id = WatcherId::next();
        *self.feed.lock().unwrap_or_else(PoisonError::into_inner) = Some(Feed {
            id,
            directory: directory.to_path_buf(),
            events,
        });
        Ok(Subscription::new(id, ()))
    }
}
