//! Temporary log files and canned content.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Content present before the engine starts in the reference scenario.
pub const INITIAL: &[u8] = b"line 1\nline 2\n";

/// Content appended after the first delivery in the reference scenario.
pub const APPENDED: &[u8] = b"\nanother line";

/// A file inside its own temporary directory. The directory is removed on drop.
pub struct TempLog {
    _dir: TempDir,
    path: PathBuf,
}

impl TempLog {
    pub fn new() -> Self {
        Self::with_content(b"")
    }

    pub fn with_content(content: &[u8]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        // Canonical so it compares equal to the engine's canonicalised path.
        let path = dir
            .path()
            .canonicalize()
            .expect("canonicalize temp dir")
            .join("app.log");
        std::fs::write(&path, content).expect("write fixture");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes` in a single write.
    pub fn append(&self, bytes: &[u8]) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .expect("open fixture for append");
        file.write_all(bytes).expect("append to fixture");
        file.flush().expect("flush fixture");
    }

    pub fn len(&self) -> u64 {
        std::fs::metadata(&self.path).expect("stat fixture").len()
    }
}

/// `n` numbered lines, each terminated by `\n`.
pub fn numbered_lines(n: usize) -> Vec<u8> {
    (0..n)
        .map(|i| format!("log line {i}\n"))
        .collect::<String>()
        .into_bytes()
}
