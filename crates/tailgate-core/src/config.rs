//! Configuration types for tailgate.
//!
//! [`TailConfig::load`] layers an optional TOML file on top of the built-in
//! defaults. [`TailConfig::new`] returns the same defaults for a given path
//! without touching the filesystem (useful in tests and when embedding).
//!
//! Configuration is immutable once an engine starts; [`TailConfig::validate`]
//! is the single gate every engine goes through and decides which
//! [`Trigger`] strategy is active.

use crate::error::ConfigError;
use crate::types::Mode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
mode          = "binary"
init_delay_ms = 100
fs_events     = true
chunk_size    = 1000

[log]
trace_deliveries = false
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Everything needed to construct one tailing engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TailConfig {
    /// File to tail. May be left empty in a config file and supplied later
    /// with [`TailConfig::with_path`].
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default)]
    pub mode: Mode,
    /// Delay before the first read of existing content.
    #[serde(default = "default_init_delay_ms")]
    pub init_delay_ms: u64,
    /// Enables the poll trigger when set.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Enables the filesystem-event trigger.
    #[serde(default = "default_fs_events")]
    pub fs_events: bool,
    /// Upper bound on a single positioned read.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub log: LogConfig,
}

/// `[log]` section. Passed into the engine explicitly instead of being read
/// from process-wide state at delivery time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Log every delivery (payload size and shape) at `info`.
    #[serde(default)]
    pub trace_deliveries: bool,
}

fn default_init_delay_ms() -> u64 { 100 }
fn default_fs_events() -> bool { true }
fn default_chunk_size() -> usize { 1000 }

/// The re-read strategy selected by a validated config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Filesystem change notifications on the file's directory.
    Events,
    /// A repeating timer with the given period.
    Poll(Duration),
    /// No trigger: the engine reads once at startup and never again.
    Never,
}

impl TailConfig {
    /// Built-in defaults for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: Mode::default(),
            init_delay_ms: default_init_delay_ms(),
            poll_interval_ms: None,
            fs_events: default_fs_events(),
            chunk_size: default_chunk_size(),
            log: LogConfig::default(),
        }
    }

    /// Load from `file` (if given), layered on top of the built-in defaults.
    /// A missing file is not an error.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse a TOML document layered on the defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn init_delay(&self) -> Duration {
        Duration::from_millis(self.init_delay_ms)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }

    /// Check the invariants an engine relies on and pick its trigger.
    ///
    /// Polling and filesystem events are mutually exclusive: enabling both is
    /// rejected rather than running two re-read sources against one offset.
    pub fn validate(&self) -> Result<Trigger, ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        match (self.poll_interval_ms, self.fs_events) {
            (Some(_), true) => Err(ConfigError::ConflictingTriggers),
            (Some(0), false) => Err(ConfigError::ZeroPollInterval),
            (Some(ms), false) => Ok(Trigger::Poll(Duration::from_millis(ms))),
            (None, true) => Ok(Trigger::Events),
            (None, false) => Ok(Trigger::Never),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
