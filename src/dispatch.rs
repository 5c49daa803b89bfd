//! Notification dispatcher — hands formatted content to the configured sink.
//!
//! [`Sink`] is a closed set of delivery shapes, all driven through
//! [`Sink::deliver`]. The [`Dispatcher`] wraps it and never fails outward:
//! a sink that errors or panics is logged and the engine carries on.

use serde::Serialize;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use tailgate_core::{LogConfig, Payload, TailMessage, STDOUT_LABEL};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// A named function sink: `func(content)`.
pub type SinkFn = fn(Payload) -> anyhow::Result<()>;

/// A named function with bound leading arguments: `func(args, content)`.
pub type BoundSinkFn = fn(&[serde_json::Value], Payload) -> anyhow::Result<()>;

/// A single-argument callback sink.
pub type Callback = Box<dyn FnMut(Payload) -> anyhow::Result<()> + Send>;

/// Where delivered content goes.
pub enum Sink {
    /// Fire-and-forget message, tagged with [`tailgate_core::MESSAGE_TAG`].
    Channel(UnboundedSender<TailMessage>),
    Function {
        name: &'static str,
        func: SinkFn,
    },
    BoundFunction {
        name: &'static str,
        func: BoundSinkFn,
        args: Vec<serde_json::Value>,
    },
    Callback(Callback),
    /// No sink configured: print `tail: <content>` to standard output.
    Stdout,
}

impl Sink {
    pub fn channel(tx: UnboundedSender<TailMessage>) -> Self {
        Sink::Channel(tx)
    }

    pub fn function(name: &'static str, func: SinkFn) -> Self {
        Sink::Function { name, func }
    }

    pub fn bound(name: &'static str, func: BoundSinkFn, args: Vec<serde_json::Value>) -> Self {
        Sink::BoundFunction { name, func, args }
    }

    pub fn callback(f: impl FnMut(Payload) -> anyhow::Result<()> + Send + 'static) -> Self {
        Sink::Callback(Box::new(f))
    }

    pub fn descriptor(&self) -> SinkDescriptor {
        match self {
            Sink::Channel(_) => SinkDescriptor::Channel,
            Sink::Function { name, .. } => SinkDescriptor::Function {
                name: (*name).to_string(),
            },
            Sink::BoundFunction { name, args, .. } => SinkDescriptor::BoundFunction {
                name: (*name).to_string(),
                args: args.clone(),
            },
            Sink::Callback(_) => SinkDescriptor::Callback,
            Sink::Stdout => SinkDescriptor::Stdout,
        }
    }

    /// Deliver one payload. Errors and panics raised by user code come back
    /// as [`SinkError`]; they never unwind past this call.
    pub fn deliver(&mut self, payload: Payload) -> Result<(), SinkError> {
        match self {
            Sink::Channel(tx) => tx
                .send(TailMessage::new(payload))
                .map_err(|_| SinkError::Disconnected),
            Sink::Function { func, .. } => {
                let func = *func;
                contain(move || func(payload))
            }
            Sink::BoundFunction { func, args, .. } => {
                let func = *func;
                contain(|| func(args.as_slice(), payload))
            }
            Sink::Callback(callback) => contain(|| callback(payload)),
            Sink::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", stdout_line(&payload))?;
                out.flush()?;
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sink({})", self.descriptor())
    }
}

fn contain(f: impl FnOnce() -> anyhow::Result<()>) -> Result<(), SinkError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(SinkError::Failed(err)),
        Err(panic) => Err(SinkError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The line the stdout sink prints for `payload`.
pub fn stdout_line(payload: &Payload) -> String {
    format!("{STDOUT_LABEL}: {payload}")
}

/// Serializable description of a sink, for status snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkDescriptor {
    Channel,
    Function {
        name: String,
    },
    BoundFunction {
        name: String,
        args: Vec<serde_json::Value>,
    },
    Callback,
    Stdout,
}

impl std::fmt::Display for SinkDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkDescriptor::Channel => write!(f, "channel"),
            SinkDescriptor::Function { name } => write!(f, "fn {name}/1"),
            SinkDescriptor::BoundFunction { name, args } => {
                write!(f, "fn {name}/{}", args.len() + 1)
            }
            SinkDescriptor::Callback => write!(f, "callback"),
            SinkDescriptor::Stdout => write!(f, "stdout"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink returned an error: {0:#}")]
    Failed(anyhow::Error),

    #[error("sink panicked: {0}")]
    Panicked(String),

    #[error("channel receiver has been dropped")]
    Disconnected,

    #[error("failed to write to stdout: {0}")]
    Stdout(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Delivery boundary between the engine and user code.
#[derive(Debug)]
pub struct Dispatcher {
    sink: Sink,
    log: LogConfig,
    path: PathBuf,
}

impl Dispatcher {
    pub fn new(sink: Sink, log: LogConfig, path: PathBuf) -> Self {
        Self { sink, log, path }
    }

    pub fn descriptor(&self) -> SinkDescriptor {
        self.sink.descriptor()
    }

    /// Deliver `payload`, logging instead of propagating any sink failure.
    pub fn deliver(&mut self, payload: Payload) {
        if self.log.trace_deliveries {
            info!(
                path = %self.path.display(),
                sink = %self.sink.descriptor(),
                bytes = payload.content_len(),
                shape = shape(&payload),
                "delivering"
            );
        }
        if let Err(err) = self.sink.deliver(payload) {
            warn!(path = %self.path.display(), error = %err, "sink delivery failed");
        }
    }
}

fn shape(payload: &Payload) -> &'static str {
    match payload {
        Payload::Bytes(_) => "bytes",
        Payload::Lines(_) => "lines",
        Payload::WatcherStopped(_) => "stop",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
