//! tailgate — follow a single file and hand appended bytes to a sink.
//!
//! This crate exposes the engine's layers as public modules so that
//! integration tests and embedding code can import them directly.
//!
//! # Architecture
//!
//! ```text
//! Watcher / poll timer ──► Engine ──► OffsetReader::drain ──► Dispatcher ──► Sink
//!                            ▲
//!            status() ───────┘
//! ```
//!
//! Each engine is one Tokio task that owns its file handle, offset and
//! buffer. Everything else talks to it through messages.
//!
//! ```no_run
//! use std::time::Duration;
//! use tailgate::{Mode, Tailer};
//!
//! # async fn example() -> Result<(), tailgate::TailError> {
//! let mut tail = Tailer::builder("/var/log/app.log")
//!     .mode(Mode::Line)
//!     .poll_every(Duration::from_millis(250))
//!     .spawn()?;
//! let mut inbox = tail.take_inbox().expect("default sink is the caller's inbox");
//! while let Some(message) = inbox.recv().await {
//!     println!("{}", message.payload);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod reader;
pub mod status;

pub use dispatch::{Sink, SinkDescriptor, SinkError};
pub use engine::{TailHandle, Tailer, TailerBuilder};
pub use error::TailError;
pub use status::TailStatus;
pub use tailgate_core::{
    ChangeKind, ConfigError, FsChange, LogConfig, Mode, Payload, TailConfig, TailMessage, TimerId, Trigger, WatcherId,
    WatcherStopped, MESSAGE_TAG,
};
pub use tailgate_watch::{ManualWatcher, NotifyWatcher, WatchSource};
