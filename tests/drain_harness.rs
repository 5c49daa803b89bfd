//! Property harness for the drain path.
//!
//! Drives [`TailState`] synchronously over an in-memory file, so every
//! property runs without Tokio or the filesystem.
//!
//! # What this covers
//!
//! - **No loss, no duplication**: binary deliveries concatenate to exactly
//!   the bytes appended, whatever the chunk size and append pattern.
//! - **Line splitting**: each line delivery, joined on `\n`, reproduces the
//!   raw bytes of that drain, including invalid UTF-8 and characters cut in
//!   half by a flush between drains.
//! - **Offset bound**: the offset tracks the bytes delivered and never runs
//!   past the end of the file.
//!
//! # Running
//!
//! ```sh
//! cargo test --test drain_harness
//! ```

use proptest::prelude::*;
use std::path::PathBuf;
use tailgate::engine::{Action, Event, TailState};
use tailgate::reader::OffsetReader;
use tailgate::{ChangeKind, FsChange, Mode, Payload, SinkDescriptor, Trigger, WatcherId};

const PATH: &str = "/logs/app.log";

fn engine(mode: Mode, chunk_size: usize) -> (TailState<Vec<u8>>, WatcherId) {
    let watcher = WatcherId::next();
    let state = TailState::new(
        PathBuf::from(PATH),
        OffsetReader::new(Vec::new(), chunk_size),
        mode,
        Trigger::Events,
        Some(watcher),
        SinkDescriptor::Callback,
    );
    (state, watcher)
}

fn modified(watcher: WatcherId) -> Event {
    Event::WatcherChange(FsChange {
        watcher,
        path: PathBuf::from(PATH),
        kind: ChangeKind::Modify,
    })
}

fn deliveries(actions: Vec<Action>) -> Vec<Payload> {
    actions
        .into_iter()
        .filter_map(|action| match action {
            Action::Deliver(payload) => Some(payload),
            Action::Halt(err) => panic!("in-memory drain halted: {err}"),
            _ => None,
        })
        .collect()
}

fn appends() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 1..12)
}

/// Arbitrary bytes (newline-heavy, with multi-byte UTF-8 mixed in) plus the
/// points at which the writer flushes.
fn content_and_cuts() -> impl Strategy<Value = (Vec<u8>, Vec<prop::sample::Index>)> {
    let piece = prop_oneof![
        3 => Just(b"\n".to_vec()),
        2 => "[a-z ]{1,8}".prop_map(String::into_bytes),
        2 => "[\u{e9}\u{3bb}\u{4e2d}\u{1f600}]{1,3}".prop_map(String::into_bytes),
        1 => prop::collection::vec(any::<u8>(), 1..6),
    ];
    (
        prop::collection::vec(piece, 0..60).prop_map(|pieces| pieces.concat()),
        prop::collection::vec(any::<prop::sample::Index>(), 0..10),
    )
}

/// Split `content` at the given points, in ascending order.
fn split_at_cuts(content: &[u8], cuts: &[prop::sample::Index]) -> Vec<Vec<u8>> {
    let mut points: Vec<usize> = cuts.iter().map(|i| i.index(content.len() + 1)).collect();
    points.sort_unstable();
    let mut pieces = Vec::new();
    let mut start = 0;
    for point in points.into_iter().chain(std::iter::once(content.len())) {
        pieces.push(content[start..point].to_vec());
        start = point;
    }
    pieces
}

proptest! {
    #[test]
    fn binary_deliveries_reassemble_the_appends(chunks in appends(), chunk_size in 1usize..512) {
        let (mut state, watcher) = engine(Mode::Binary, chunk_size);
        prop_assert!(deliveries(state.handle(Event::Initialize)).is_empty());

        let mut written = Vec::new();
        let mut seen = Vec::new();
        for chunk in &chunks {
            state.reader_mut().handle_mut().extend_from_slice(chunk);
            written.extend_from_slice(chunk);

            let delivered = deliveries(state.handle(modified(watcher)));
            prop_assert!(delivered.len() <= 1, "one drain, at most one delivery");
            for payload in delivered {
                match payload {
                    Payload::Bytes(bytes) => {
                        prop_assert!(!bytes.is_empty(), "empty drains must not deliver");
                        seen.extend_from_slice(&bytes);
                    }
                    other => prop_assert!(false, "binary mode delivered {other:?}"),
                }
            }

            let status = state.status();
            prop_assert_eq!(status.offset, written.len() as u64);
            prop_assert!(status.buffer.is_empty());
        }
        prop_assert_eq!(seen, written);
    }

    #[test]
    fn line_deliveries_rejoin_to_the_raw_bytes(
        (content, cuts) in content_and_cuts(),
        chunk_size in 1usize..64,
    ) {
        let (mut state, watcher) = engine(Mode::Line, chunk_size);
        state.handle(Event::Initialize);

        let mut rejoined = Vec::new();
        for piece in split_at_cuts(&content, &cuts) {
            state.reader_mut().handle_mut().extend_from_slice(&piece);
            let delivered = deliveries(state.handle(modified(watcher)));
            if piece.is_empty() {
                prop_assert!(delivered.is_empty());
                continue;
            }
            prop_assert_eq!(delivered.len(), 1);
            match &delivered[0] {
                Payload::Lines(lines) => {
                    let newlines = piece.iter().filter(|b| **b == b'\n').count();
                    prop_assert_eq!(lines.len(), newlines + 1);
                    let joined = lines.join(&b'\n');
                    prop_assert_eq!(&joined, &piece);
                    rejoined.extend_from_slice(&joined);
                }
                other => prop_assert!(false, "line mode delivered {other:?}"),
            }
        }
        prop_assert_eq!(rejoined, content);
    }

    #[test]
    fn offset_never_passes_end_of_file(chunks in appends(), chunk_size in 1usize..128) {
        let (mut state, watcher) = engine(Mode::Binary, chunk_size);
        state.handle(Event::Initialize);

        let mut len = 0u64;
        let mut delivered_len = 0u64;
        for chunk in &chunks {
            state.reader_mut().handle_mut().extend_from_slice(chunk);
            len += chunk.len() as u64;
            // Spurious notifications on an unchanged file are no-ops.
            for _ in 0..2 {
                for payload in deliveries(state.handle(modified(watcher))) {
                    delivered_len += payload.content_len() as u64;
                }
                let offset = state.status().offset;
                prop_assert!(offset <= len);
                prop_assert_eq!(offset, delivered_len);
            }
        }
        prop_assert_eq!(state.status().offset, len);
    }
}

#[test]
fn multibyte_character_split_across_drains_is_not_replaced() {
    let (mut state, watcher) = engine(Mode::Line, 1000);
    state.handle(Event::Initialize);

    let mut rejoined = Vec::new();
    // "café\n" flushed in the middle of "é" (c3 a9).
    for piece in [&b"caf\xc3"[..], &b"\xa9\n"[..]] {
        state.reader_mut().handle_mut().extend_from_slice(piece);
        for payload in deliveries(state.handle(modified(watcher))) {
            match payload {
                Payload::Lines(lines) => rejoined.extend_from_slice(&lines.join(&b'\n')),
                other => panic!("line mode delivered {other:?}"),
            }
        }
    }
    assert_eq!(rejoined, "caf\u{e9}\n".as_bytes());
}
