//! Aggregate persistence.
//!
//! # Responsibilities
//! - Read the last-known-good aggregate at startup
//! - Overwrite it on every commit or revert
//!
//! # Design Decisions
//! - The persisted file and the file handed to the server are the same
//! - Writes go to a sibling temp file first and are renamed into place, so
//!   the server never reads a half-written aggregate

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The on-disk aggregate file.
#[derive(Debug, Clone)]
pub struct AggregateStore {
    path: PathBuf,
}

impl AggregateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored aggregate. A missing file is `Ok(None)`.
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace the stored aggregate with `text`.
    pub fn write(&self, text: &str) -> io::Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "Aggregate written");
        Ok(())
    }
}
