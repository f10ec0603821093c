//! Log file follower.
//!
//! # Responsibilities
//! - Tail a file from the position it had when following began
//! - Yield complete lines only
//!
//! # Design Decisions
//! - Polling, not inotify: the log lives outside the watched tenant trees
//! - A missing file is followed from offset 0 once it appears
//! - A file shorter than our offset was truncated; start over from 0

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const READ_CHUNK: usize = 8192;

/// Follows appended lines of one file.
#[derive(Debug)]
pub struct LogFollower {
    path: PathBuf,
    file: Option<File>,
    offset: u64,
    pending: Vec<u8>,
    poll_interval: Duration,
}

impl LogFollower {
    /// Start following `path` from its current end.
    pub async fn from_end(path: impl AsRef<Path>, poll_interval: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let offset = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        Self {
            path,
            file: None,
            offset,
            pending: Vec::new(),
            poll_interval,
        }
    }

    /// Wait for the next complete line (without its newline).
    pub async fn next_line(&mut self) -> io::Result<String> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            if !self.read_more().await? {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        let line = String::from_utf8_lossy(&raw[..end]);
        Some(line.trim_end_matches('\r').to_string())
    }

    /// Read whatever is available. Returns `false` if nothing was.
    async fn read_more(&mut self) -> io::Result<bool> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if len < self.offset {
            tracing::debug!(path = %self.path.display(), "Log truncated, following from start");
            self.file = None;
            self.offset = 0;
            self.pending.clear();
        }

        if self.file.is_none() {
            let mut file = File::open(&self.path).await?;
            file.seek(SeekFrom::Start(self.offset)).await?;
            self.file = Some(file);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(false);
        };

        let mut buf = [0u8; READ_CHUNK];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(false);
        }
        self.offset += n as u64;
        self.pending.extend_from_slice(&buf[..n]);
        Ok(true)
    }
}
