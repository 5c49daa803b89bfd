//! Domain-specific assertion macros for tailgate harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! tailing invariant was violated.

use tailgate::TailStatus;

/// Assert that a payload is a binary delivery of exactly `$expected`.
///
/// ```rust
/// assert_bytes!(collector.next().await, b"line 1\n");
/// ```
#[macro_export]
macro_rules! assert_bytes {
    ($payload:expr, $expected:expr) => {{
        let payload: tailgate::Payload = $payload;
        let expected: &[u8] = $expected;
        match payload {
            tailgate::Payload::Bytes(actual) => pretty_assertions::assert_eq!(
                String::from_utf8_lossy(&actual),
                String::from_utf8_lossy(expected),
                "binary delivery differs from the appended bytes"
            ),
            other => panic!("assert_bytes! failed: expected a binary payload, got {other:?}"),
        }
    }};
}

/// Assert that a payload is a line delivery equal to `$expected`, byte for
/// byte. Lines are shown decoded so failures read as text.
#[macro_export]
macro_rules! assert_lines {
    ($payload:expr, $expected:expr) => {{
        let payload: tailgate::Payload = $payload;
        let expected = tailgate::Payload::lines($expected);
        match (payload, expected) {
            (tailgate::Payload::Lines(actual), tailgate::Payload::Lines(expected)) => {
                let shown = |lines: &[bytes::Bytes]| -> Vec<String> {
                    lines.iter().map(|l| String::from_utf8_lossy(l).into_owned()).collect()
                };
                pretty_assertions::assert_eq!(
                    shown(&actual),
                    shown(&expected),
                    "line delivery differs from the naive split"
                );
                assert_eq!(actual, expected, "line bytes differ");
            }
            (other, _) => panic!("assert_lines! failed: expected a line payload, got {other:?}"),
        }
    }};
}

/// Assert the offset invariant: everything read, nothing past the end.
pub fn assert_offset_at_end(status: &TailStatus, file_len: u64) {
    assert!(
        status.offset <= file_len,
        "offset {} ran past end of file ({file_len} bytes)",
        status.offset
    );
    assert_eq!(
        status.offset, file_len,
        "offset {} does not cover the {file_len} bytes on disk",
        status.offset
    );
    assert!(status.buffer.is_empty(), "buffer not empty between drains");
}
