//! Runtime — the control loop that drives a [`TailState`].
//!
//! One Tokio task per engine. Timers and the watcher feed events into the
//! task; status queries arrive on the same mailbox. The loop applies events
//! one at a time and executes the resulting actions inline, so deliveries
//! leave in exactly the order drains completed.

use super::{Action, Event, TailState};
use crate::dispatch::{Dispatcher, Sink};
use crate::error::TailError;
use crate::reader::OffsetReader;
use crate::status::TailStatus;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tailgate_core::{Mode, TailConfig, TailMessage, Trigger, WatchMessage};
use tailgate_watch::{NotifyWatcher, Subscription, WatchSource};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info};

/// Entry point for starting engines.
pub struct Tailer;

impl Tailer {
    /// Start configuring an engine for `path` with the built-in defaults.
    pub fn builder(path: impl Into<PathBuf>) -> TailerBuilder {
        TailerBuilder::from_config(TailConfig::new(path))
    }
}

/// Collects configuration, then [`spawn`](TailerBuilder::spawn)s the engine.
pub struct TailerBuilder {
    config: TailConfig,
    sink: Option<Sink>,
    watch: Box<dyn WatchSource>,
}

impl TailerBuilder {
    pub fn from_config(config: TailConfig) -> Self {
        Self {
            config,
            sink: None,
            watch: Box::new(NotifyWatcher::new()),
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn init_delay(mut self, delay: Duration) -> Self {
        self.config.init_delay_ms = millis(delay);
        self
    }

    /// Select the poll trigger. Turns filesystem events off.
    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = Some(millis(interval));
        self.config.fs_events = false;
        self
    }

    pub fn fs_events(mut self, enabled: bool) -> Self {
        self.config.fs_events = enabled;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    pub fn trace_deliveries(mut self, enabled: bool) -> Self {
        self.config.log.trace_deliveries = enabled;
        self
    }

    /// Deliver to `sink` instead of the caller's inbox.
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use `watch` for the event trigger instead of `notify`.
    pub fn watch_source(mut self, watch: impl WatchSource + 'static) -> Self {
        self.watch = Box::new(watch);
        self
    }

    /// Open the file, subscribe the watcher (if enabled) and start the
    /// control loop. Must be called from within a Tokio runtime.
    ///
    /// Fails synchronously if the configuration is invalid, the file cannot
    /// be opened, or the watcher cannot subscribe.
    pub fn spawn(self) -> Result<TailHandle, TailError> {
        let TailerBuilder {
            config,
            sink,
            mut watch,
        } = self;
        let trigger = config.validate()?;

        let open_err = |source| TailError::Open {
            path: config.path.clone(),
            source,
        };
        let file = File::open(&config.path).map_err(open_err)?;
        let path = config.path.canonicalize().map_err(open_err)?;

        let (sink, inbox) = match sink {
            Some(sink) => (sink, None),
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Sink::channel(tx), Some(rx))
            }
        };

        let (watch_tx, watch_rx) = mpsc::unbounded_channel();
        let subscription = match trigger {
            Trigger::Events => {
                let directory = path.parent().unwrap_or_else(|| Path::new("/"));
                Some(watch.subscribe(directory, watch_tx)?)
            }
            _ => None,
        };

        let dispatcher = Dispatcher::new(sink, config.log.clone(), path.clone());
        let state = TailState::new(
            path.clone(),
            OffsetReader::new(file, config.chunk_size),
            config.mode,
            trigger,
            subscription.as_ref().map(Subscription::id),
            dispatcher.descriptor(),
        );

        let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let engine = Engine {
            state,
            dispatcher,
            subscription,
            mailbox: mailbox_tx.clone(),
            init_timer: None,
            poll_timer: None,
        };

        info!(path = %path.display(), ?trigger, mode = %config.mode, "starting tail engine");
        let task = tokio::spawn(engine.run(
            mailbox_rx,
            watch_rx,
            cancel.clone(),
            config.init_delay(),
        ));

        Ok(TailHandle {
            path,
            mailbox: mailbox_tx,
            inbox,
            cancel: cancel.clone(),
            guard: cancel.drop_guard(),
            task,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// TailHandle
// ---------------------------------------------------------------------------

/// Caller's side of a running engine. Dropping it stops the engine.
pub struct TailHandle {
    path: PathBuf,
    mailbox: mpsc::UnboundedSender<Event>,
    inbox: Option<mpsc::UnboundedReceiver<TailMessage>>,
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<TailStatus, TailError>>,
}

impl TailHandle {
    /// Canonical path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Receiving end of the default channel sink. `None` if a sink was
    /// configured explicitly, or if the inbox was already taken.
    pub fn take_inbox(&mut self) -> Option<mpsc::UnboundedReceiver<TailMessage>> {
        self.inbox.take()
    }

    /// Snapshot of the engine, taken between events.
    pub async fn status(&self) -> Result<TailStatus, TailError> {
        let (tx, rx) = oneshot::channel();
        self.mailbox
            .send(Event::Status(tx))
            .map_err(|_| TailError::Closed)?;
        rx.await.map_err(|_| TailError::Closed)
    }

    /// Resolves once the engine has stopped, for whatever reason.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the engine and wait for it. Returns the final status, or the
    /// read error that stopped it earlier.
    pub async fn shutdown(self) -> Result<TailStatus, TailError> {
        let TailHandle { guard, task, .. } = self;
        drop(guard);
        task.await?
    }
}

// ---------------------------------------------------------------------------
// Control loop
// ---------------------------------------------------------------------------

struct Engine {
    state: TailState<File>,
    dispatcher: Dispatcher,
    subscription: Option<Subscription>,
    mailbox: mpsc::UnboundedSender<Event>,
    init_timer: Option<JoinHandle<()>>,
    poll_timer: Option<JoinHandle<()>>,
}

impl Engine {
    async fn run(
        mut self,
        mut mailbox: mpsc::UnboundedReceiver<Event>,
        mut watch: mpsc::UnboundedReceiver<WatchMessage>,
        cancel: CancellationToken,
        init_delay: Duration,
    ) -> Result<TailStatus, TailError> {
        self.init_timer = Some(self.schedule(init_delay, Event::Initialize));
        let mut watch_open = true;

        let outcome = loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                Some(event) = mailbox.recv() => event,
                message = watch.recv(), if watch_open => match message {
                    Some(message) => Event::from(message),
                    None => {
                        debug!("watch channel closed");
                        watch_open = false;
                        continue;
                    }
                },
            };
            if let Err(err) = self.apply(event) {
                break Err(err);
            }
        };

        self.teardown();
        cancel.cancel();
        match outcome {
            Ok(()) => {
                let status = self.state.status();
                info!(path = %status.path.display(), offset = status.offset, "tail engine stopped");
                Ok(status)
            }
            Err(err) => {
                error!(error = %err, "tail engine halted");
                Err(err)
            }
        }
    }

    fn apply(&mut self, event: Event) -> Result<(), TailError> {
        for action in self.state.handle(event) {
            match action {
                Action::ArmPollTimer { timer, after } => {
                    if let Some(pending) = self.poll_timer.take() {
                        pending.abort();
                    }
                    self.poll_timer = Some(self.schedule(after, Event::PollTick(timer)));
                }
                Action::Deliver(payload) => self.dispatcher.deliver(payload),
                Action::Reply(reply, status) => {
                    // The caller may have stopped waiting.
                    let _ = reply.send(status);
                }
                Action::Halt(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Deliver `event` to our own mailbox once `after` has elapsed, measured
    /// from now rather than from when the timer task first runs.
    fn schedule(&self, after: Duration, event: Event) -> JoinHandle<()> {
        let mailbox = self.mailbox.clone();
        let deadline = tokio::time::sleep(after);
        tokio::spawn(async move {
            deadline.await;
            let _ = mailbox.send(event);
        })
    }

    /// Cancel timers and drop the watch. The file handle goes with `self`.
    fn teardown(&mut self) {
        for timer in [self.init_timer.take(), self.poll_timer.take()].into_iter().flatten() {
            timer.abort();
        }
        if let Some(subscription) = self.subscription.take() {
            debug!(watcher = %subscription.id(), "dropping watch subscription");
        }
    }
}
