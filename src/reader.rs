//! Offset reader — drains everything appended since the last drain.
//!
//! The reader owns the read handle, the byte offset of the next unread byte,
//! and the accumulation buffer. A drain issues positioned reads of at most
//! `chunk_size` bytes until one returns zero bytes, then hands back the
//! accumulated chunk formatted for the configured [`Mode`].
//!
//! Reads are blocking and executed inline on the engine's control loop; they
//! are expected to be local and short.

use bytes::Bytes;
use std::io;
use tailgate_core::{Mode, Payload};

/// Positioned reads that leave no cursor behind.
pub trait ReadAt {
    /// Read up to `buf.len()` bytes starting at `offset`. `Ok(0)` is end of
    /// stream.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl ReadAt for std::fs::File {
    #[cfg(unix)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

/// In-memory "file"; the tail of the vector is the end of the file.
impl ReadAt for Vec<u8> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

#[derive(Debug)]
pub struct OffsetReader<R> {
    handle: R,
    offset: u64,
    buffer: Vec<u8>,
    chunk_size: usize,
}

impl<R: ReadAt> OffsetReader<R> {
    /// Start reading `handle` from offset zero.
    pub fn new(handle: R, chunk_size: usize) -> Self {
        Self {
            handle,
            offset: 0,
            buffer: Vec::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Byte position of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes read but not yet handed out. Empty between drains.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn handle_mut(&mut self) -> &mut R {
        &mut self.handle
    }

    /// Read from the current offset to end of stream.
    ///
    /// Returns `None` when nothing new was written since the last drain. On
    /// error the offset stays at the last byte successfully read and the
    /// partial chunk remains buffered.
    pub fn drain(&mut self, mode: Mode) -> io::Result<Option<Payload>> {
        loop {
            let filled = self.buffer.len();
            self.buffer.resize(filled + self.chunk_size, 0);
            match self.handle.read_at(self.offset, &mut self.buffer[filled..]) {
                Ok(0) => {
                    self.buffer.truncate(filled);
                    break;
                }
                Ok(n) => {
                    self.buffer.truncate(filled + n);
                    self.offset += n as u64;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    self.buffer.truncate(filled);
                }
                Err(err) => {
                    self.buffer.truncate(filled);
                    return Err(err);
                }
            }
        }

        if self.buffer.is_empty() {
            return Ok(None);
        }
        Ok(Some(format(mode, std::mem::take(&mut self.buffer))))
    }
}

/// Shape a drained chunk for delivery.
///
/// Line mode is a naive split on `\n`: a chunk ending in a newline yields a
/// trailing empty line, and a line broken across two drains arrives as two
/// pieces. Lines are slices of the chunk, so no bytes are decoded or lost.
pub fn format(mode: Mode, chunk: Vec<u8>) -> Payload {
    let chunk = Bytes::from(chunk);
    match mode {
        Mode::Binary => Payload::Bytes(chunk),
        Mode::Line => {
            let mut lines = Vec::new();
            let mut start = 0;
            for (i, _) in chunk.iter().enumerate().filter(|(_, b)| **b == b'\n') {
                lines.push(chunk.slice(start..i));
                start = i + 1;
            }
            lines.push(chunk.slice(start..));
            Payload::Lines(lines)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
