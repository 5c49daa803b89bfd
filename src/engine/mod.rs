//! Engine — the tailing state machine.
//!
//! All inputs are [`Event`]s; [`TailState::handle`] applies one event and
//! returns the [`Action`]s the runtime must carry out (arm a timer, deliver
//! content, answer a status query, halt). The state machine itself never
//! sleeps, spawns or touches a channel, so it can be driven synchronously in
//! tests with an in-memory file.
//!
//! ```text
//! Initialize ──► drain ──► [arm poll timer]
//! PollTick   ──► arm next tick ──► drain
//! Change     ──► drain              (only for the tailed path)
//! Stop       ──► deliver stop signal
//! ```

pub mod runtime;

pub use runtime::{TailHandle, Tailer, TailerBuilder};

use crate::dispatch::SinkDescriptor;
use crate::error::TailError;
use crate::reader::{OffsetReader, ReadAt};
use crate::status::TailStatus;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tailgate_core::{FsChange, Mode, Payload, TimerId, Trigger, WatchMessage, WatcherId, WatcherStopped};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

/// Input to the state machine.
#[derive(Debug)]
pub enum Event {
    /// The deferred startup read.
    Initialize,
    /// A poll timer fired.
    PollTick(TimerId),
    WatcherChange(FsChange),
    WatcherStop(WatcherStopped),
    Status(oneshot::Sender<TailStatus>),
}

impl From<WatchMessage> for Event {
    fn from(message: WatchMessage) -> Self {
        match message {
            WatchMessage::Change(change) => Event::WatcherChange(change),
            WatchMessage::Stop(stop) => Event::WatcherStop(stop),
        }
    }
}

/// Side effect requested by the state machine.
#[derive(Debug)]
pub enum Action {
    /// Schedule `PollTick(timer)` after `after`, cancelling any pending tick.
    ArmPollTimer { timer: TimerId, after: Duration },
    Deliver(Payload),
    Reply(oneshot::Sender<TailStatus>, TailStatus),
    /// Stop the engine. Always the last action of a batch.
    Halt(TailError),
}

/// Everything the engine knows. Owned by exactly one control loop.
#[derive(Debug)]
pub struct TailState<R> {
    path: PathBuf,
    reader: OffsetReader<R>,
    mode: Mode,
    trigger: Trigger,
    watcher: Option<WatcherId>,
    poll_timer: Option<TimerId>,
    timer_generation: u64,
    sink: SinkDescriptor,
    initialized: bool,
    deliveries: u64,
    last_delivery_at: Option<DateTime<Utc>>,
}

impl<R: ReadAt> TailState<R> {
    pub fn new(
        path: PathBuf,
        reader: OffsetReader<R>,
        mode: Mode,
        trigger: Trigger,
        watcher: Option<WatcherId>,
        sink: SinkDescriptor,
    ) -> Self {
        Self {
            path,
            reader,
            mode,
            trigger,
            watcher,
            poll_timer: None,
            timer_generation: 0,
            sink,
            initialized: false,
            deliveries: 0,
            last_delivery_at: None,
        }
    }

    pub fn reader_mut(&mut self) -> &mut OffsetReader<R> {
        &mut self.reader
    }

    pub fn status(&self) -> TailStatus {
        TailStatus {
            path: self.path.clone(),
            buffer: self.reader.buffered().to_vec(),
            offset: self.reader.offset(),
            mode: self.mode,
            watcher: self.watcher,
            poll_timer: self.poll_timer,
            sink: self.sink.clone(),
            initialized: self.initialized,
            deliveries: self.deliveries,
            last_delivery_at: self.last_delivery_at,
        }
    }

    /// Apply one event.
    pub fn handle(&mut self, event: Event) -> Vec<Action> {
        let mut actions = Vec::new();
        match event {
            Event::Initialize => {
                if self.initialized {
                    warn!(path = %self.path.display(), "duplicate initialize ignored");
                    return actions;
                }
                self.initialized = true;
                if self.drain(&mut actions) {
                    if let Trigger::Poll(every) = self.trigger {
                        actions.push(self.arm_poll(every));
                    }
                }
            }

            Event::PollTick(timer) => match self.trigger {
                Trigger::Poll(every) if self.poll_timer == Some(timer) => {
                    // Re-arm before reading so a slow drain never loses a tick.
                    actions.push(self.arm_poll(every));
                    self.drain(&mut actions);
                }
                Trigger::Poll(_) => {
                    debug!(path = %self.path.display(), %timer, "stale poll tick ignored");
                }
                _ => {
                    warn!(path = %self.path.display(), %timer, "poll tick without a poll trigger ignored");
                }
            },

            Event::WatcherChange(change) => {
                if self.watcher != Some(change.watcher) {
                    warn!(
                        path = %self.path.display(),
                        watcher = %change.watcher,
                        "change from unrecognized watcher ignored"
                    );
                } else if change.path != self.path {
                    trace!(path = %change.path.display(), kind = %change.kind, "unrelated change");
                } else {
                    self.drain(&mut actions);
                }
            }

            Event::WatcherStop(stop) => {
                if self.watcher != Some(stop.watcher) {
                    warn!(
                        path = %self.path.display(),
                        watcher = %stop.watcher,
                        "stop from unrecognized watcher ignored"
                    );
                } else {
                    info!(path = %self.path.display(), watcher = %stop.watcher, "watcher stopped");
                    self.watcher = None;
                    self.record_delivery();
                    actions.push(Action::Deliver(Payload::WatcherStopped(stop)));
                }
            }

            Event::Status(reply) => actions.push(Action::Reply(reply, self.status())),
        }
        actions
    }

    /// Drain new content into `actions`. Returns `false` if the engine must halt.
    fn drain(&mut self, actions: &mut Vec<Action>) -> bool {
        match self.reader.drain(self.mode) {
            Ok(Some(payload)) => {
                debug!(
                    path = %self.path.display(),
                    offset = self.reader.offset(),
                    bytes = payload.content_len(),
                    "drained"
                );
                self.record_delivery();
                actions.push(Action::Deliver(payload));
                true
            }
            Ok(None) => true,
            Err(source) => {
                actions.push(Action::Halt(TailError::Read {
                    path: self.path.clone(),
                    offset: self.reader.offset(),
                    source,
                }));
                false
            }
        }
    }

    fn arm_poll(&mut self, every: Duration) -> Action {
        self.timer_generation += 1;
        let timer = TimerId::new(self.timer_generation);
        self.poll_timer = Some(timer);
        Action::ArmPollTimer { timer, after: every }
    }

    fn record_delivery(&mut self) {
        self.deliveries += 1;
        self.last_delivery_at = Some(Utc::now());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
