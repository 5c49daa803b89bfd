//! Core types for tailgate-core.
//!
//! This module defines the data that flows between the watcher, the engine
//! and the sinks: the delivery [`Payload`], the channel-sink envelope
//! [`TailMessage`], the formatting [`Mode`], and the watcher/timer handles
//! that show up in status snapshots.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed marker carried by every message sent to a channel sink.
pub const MESSAGE_TAG: &str = "tail";

/// Label prefixed to every line written by the stdout sink.
pub const STDOUT_LABEL: &str = "tail";

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How an accumulated chunk is shaped before it reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Bytes are passed through unchanged.
    #[default]
    Binary,
    /// Bytes are split on `\n` into an ordered list of lines.
    Line,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Binary => write!(f, "binary"),
            Mode::Line => write!(f, "line"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(Mode::Binary),
            "line" => Ok(Mode::Line),
            other => Err(format!("unknown mode {other:?} (expected `binary` or `line`)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

static NEXT_WATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one watcher subscription. Unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Allocate a fresh, process-unique id.
    pub fn next() -> Self {
        Self(NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WatcherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watcher-{}", self.0)
    }
}

/// Generation number of an armed poll timer. Each re-arm bumps it, so a tick
/// from a cancelled generation can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Watcher messages
// ---------------------------------------------------------------------------

/// Coarse classification of a filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Modify,
    Remove,
    Rename,
    Other,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "create"),
            ChangeKind::Modify => write!(f, "modify"),
            ChangeKind::Remove => write!(f, "remove"),
            ChangeKind::Rename => write!(f, "rename"),
            ChangeKind::Other => write!(f, "other"),
        }
    }
}

/// "Something changed at `path`", as reported by the watcher `watcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChange {
    pub watcher: WatcherId,
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// The watcher `watcher` has terminated and will emit nothing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherStopped {
    pub watcher: WatcherId,
}

impl std::fmt::Display for WatcherStopped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}, stop}}", self.watcher)
    }
}

/// Everything a watcher subscription can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    Change(FsChange),
    Stop(WatcherStopped),
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Content handed to a sink.
///
/// `WatcherStopped` is the one payload that is not file content: it is the
/// watcher's stop signal passed through verbatim so subscribers can notice
/// that event-driven tailing has ended.
///
/// Line elements are raw bytes. A multi-byte character split across two
/// drains stays intact once the pieces are rejoined; decoding happens only
/// when a payload is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Bytes),
    Lines(Vec<Bytes>),
    WatcherStopped(WatcherStopped),
}

impl Payload {
    /// Build a line payload by copying each element.
    pub fn lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        Payload::Lines(
            lines
                .into_iter()
                .map(|line| Bytes::copy_from_slice(line.as_ref()))
                .collect(),
        )
    }

    /// Number of content bytes carried (zero for the stop signal).
    pub fn content_len(&self) -> usize {
        match self {
            Payload::Bytes(bytes) => bytes.len(),
            // +1 per separator; the naive split drops exactly one `\n` between elements.
            Payload::Lines(lines) => {
                lines.iter().map(Bytes::len).sum::<usize>() + lines.len().saturating_sub(1)
            }
            Payload::WatcherStopped(_) => 0,
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Payload::Lines(lines) => {
                let rendered: Vec<_> = lines.iter().map(|line| String::from_utf8_lossy(line)).collect();
                write!(f, "{rendered:?}")
            }
            Payload::WatcherStopped(stop) => write!(f, "{stop}"),
        }
    }
}

/// Envelope sent to a channel sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailMessage {
    /// Always [`MESSAGE_TAG`].
    pub tag: &'static str,
    pub payload: Payload,
}

impl TailMessage {
    pub fn new(payload: Payload) -> Self {
        Self {
            tag: MESSAGE_TAG,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
