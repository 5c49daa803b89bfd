//! Shared test utilities for tailgate integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Waits are bounded by [`WAIT`] so a broken engine fails
//! the test instead of hanging it.
//!
//! Timer-driven harnesses run with `#[tokio::test(start_paused = true)]`: the
//! runtime jumps straight to the next poll tick whenever the engine is idle,
//! and `tokio::time::advance` steps through delays explicitly. Tests that wait
//! on a real `notify` watcher must keep wall-clock time, since its events
//! arrive from outside the runtime.
#![allow(dead_code, unused_imports)]

pub mod assertions;
pub mod fixtures;
pub mod sinks;

pub use assertions::*;
pub use fixtures::*;
pub use sinks::*;

use std::time::Duration;

/// Upper bound on any single wait for engine output.
pub const WAIT: Duration = Duration::from_secs(5);

/// Short poll interval used by poll-triggered harnesses.
pub const FAST_POLL: Duration = Duration::from_millis(15);
