//! `notify`-backed watcher (inotify, FSEvents, ReadDirectoryChangesW, ...).
//!
//! Access events are dropped: the engine's own reads would otherwise wake
//! it up again. The watch ends with a single `Stop` when the backend reports
//! that the watched directory is gone.

use crate::{Subscription, WatchError, WatchSource};
use notify::event::{EventKind, ModifyKind};
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tailgate_core::{ChangeKind, FsChange, WatchMessage, WatcherId, WatcherStopped};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Watches a directory with the platform's recommended `notify` backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyWatcher;

impl NotifyWatcher {
    pub fn new() -> Self {
        Self
    }
}

impl WatchSource for NotifyWatcher {
    fn subscribe(
        &mut self,
        directory: &Path,
        events: UnboundedSender<WatchMessage>,
    ) -> Result<Subscription, WatchError> {
        let id = WatcherId::next();
        let root = directory.to_path_buf();
        let mut stopped = false;

        let mut watcher = notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| {
                if stopped {
                    return;
                }
                for message in translate(id, &root, res) {
                    if matches!(message, WatchMessage::Stop(_)) {
                        stopped = true;
                    }
                    if events.send(message).is_err() {
                        // Engine is gone; nothing left to notify.
                        return;
                    }
                }
            },
        )
        .map_err(WatchError::Init)?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Subscribe {
                path: directory.to_path_buf(),
                source,
            })?;

        debug!(watcher = %id, path = %directory.display(), "watching directory");
        Ok(Subscription::new(id, watcher))
    }
}

/// Map one backend callback into zero or more watch messages.
pub(crate) fn translate(
    id: WatcherId,
    root: &Path,
    res: Result<notify::Event, notify::Error>,
) -> Vec<WatchMessage> {
    let event = match res {
        Ok(event) => event,
        Err(err) => {
            return match err.kind {
                notify::ErrorKind::PathNotFound | notify::ErrorKind::WatchNotFound => {
                    warn!(watcher = %id, error = %err, "watch lost");
                    vec![WatchMessage::Stop(WatcherStopped { watcher: id })]
                }
                _ => {
                    warn!(watcher = %id, error = %err, "watcher error");
                    Vec::new()
                }
            };
        }
    };

    let kind = match event.kind {
        EventKind::Access(_) => return Vec::new(),
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
        EventKind::Modify(_) => ChangeKind::Modify,
        EventKind::Remove(_) => ChangeKind::Remove,
        EventKind::Any | EventKind::Other => ChangeKind::Other,
    };

    let root_removed = kind == ChangeKind::Remove && event.paths.iter().any(|p| p == root);

    let mut messages: Vec<WatchMessage> = event
        .paths
        .into_iter()
        .filter(|p| p != root)
        .map(|path: PathBuf| {
            WatchMessage::Change(FsChange {
                watcher: id,
                path,
                kind,
            })
        })
        .collect();

    if root_removed {
        messages.push(WatchMessage::Stop(WatcherStopped { watcher: id }));
    }
    messages
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
