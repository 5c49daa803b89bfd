//! Point-in-time snapshot of an engine, for diagnostics and tests.

use crate::dispatch::SinkDescriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tailgate_core::{Mode, TimerId, WatcherId};

/// Built by the control loop between events, so it never shows a drain in
/// progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailStatus {
    pub path: PathBuf,
    /// Bytes read but not yet delivered (empty between drains).
    pub buffer: Vec<u8>,
    pub offset: u64,
    pub mode: Mode,
    /// Live watcher subscription; `None` when polling, or after the watcher stopped.
    pub watcher: Option<WatcherId>,
    /// Currently armed poll timer; `None` unless polling.
    pub poll_timer: Option<TimerId>,
    pub sink: SinkDescriptor,
    /// Whether the deferred startup read has run.
    pub initialized: bool,
    pub deliveries: u64,
    pub last_delivery_at: Option<DateTime<Utc>>,
}
