//! Sinks that record what they receive, plus bounded waits over them.

use super::WAIT;
use tailgate::{Payload, Sink, TailMessage};
use tokio::sync::mpsc;

/// Receiving side of a [`collecting_sink`].
pub struct Collector {
    rx: mpsc::UnboundedReceiver<Payload>,
}

/// A callback sink that forwards every payload to the returned [`Collector`].
pub fn collecting_sink() -> (Sink, Collector) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = Sink::callback(move |payload| {
        tx.send(payload)?;
        Ok(())
    });
    (sink, Collector { rx })
}

impl Collector {
    /// Next payload, panicking after [`WAIT`].
    pub async fn next(&mut self) -> Payload {
        next_payload(&mut self.rx).await
    }

    /// Collect binary deliveries until at least `len` bytes have arrived.
    pub async fn bytes(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while out.len() < len {
            out.extend_from_slice(&expect_bytes(self.next().await));
        }
        out
    }

    /// Assert nothing is delivered for `quiet`.
    pub async fn assert_silent(&mut self, quiet: std::time::Duration) {
        if let Ok(Some(payload)) = tokio::time::timeout(quiet, self.rx.recv()).await {
            panic!("expected no delivery, got {payload:?}");
        }
    }
}

async fn next_payload(rx: &mut mpsc::UnboundedReceiver<Payload>) -> Payload {
    match tokio::time::timeout(WAIT, rx.recv()).await {
        Ok(Some(payload)) => payload,
        Ok(None) => panic!("sink channel closed"),
        Err(_) => panic!("no delivery within {WAIT:?}"),
    }
}

/// Next message from the caller's default inbox, panicking after [`WAIT`].
pub async fn next_message(inbox: &mut mpsc::UnboundedReceiver<TailMessage>) -> TailMessage {
    match tokio::time::timeout(WAIT, inbox.recv()).await {
        Ok(Some(message)) => message,
        Ok(None) => panic!("inbox closed"),
        Err(_) => panic!("no message within {WAIT:?}"),
    }
}

/// Unwrap a binary payload.
pub fn expect_bytes(payload: Payload) -> Vec<u8> {
    match payload {
        Payload::Bytes(bytes) => bytes.to_vec(),
        other => panic!("expected a binary payload, got {other:?}"),
    }
}

/// Unwrap a line payload.
pub fn expect_lines(payload: Payload) -> Vec<bytes::Bytes> {
    match payload {
        Payload::Lines(lines) => lines,
        other => panic!("expected a line payload, got {other:?}"),
    }
}
