//! Destinations for generated artifacts.
//!
//! Sinks only touch a file when its content changes, so rerunning the
//! compiler on an unchanged model leaves build timestamps alone.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use crate::artifact::ArtifactSet;

/// Failure to persist an artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("artifact path '{0}' escapes the destination directory")]
    InvalidPath(String),
}

/// Whether a write changed anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Receives generated files.
pub trait ArtifactSink {
    /// Store `content` at `path`, relative to the sink's root.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] when the content cannot be stored.
    fn write(&mut self, path: &str, content: &str) -> Result<WriteOutcome, SinkError>;

    /// Store every file of `artifacts`, returning how many actually changed.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write.
    fn write_all(&mut self, artifacts: &ArtifactSet) -> Result<usize, SinkError> {
        let mut written = 0;
        for (path, content) in artifacts.iter() {
            if self.write(path, content)? == WriteOutcome::Written {
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Writes artifacts below a destination directory.
#[derive(Clone, Debug)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSink { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SinkError> {
        let mut full = self.root.clone();
        for part in path.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return Err(SinkError::InvalidPath(path.to_string()));
            }
            full.push(part);
        }
        Ok(full)
    }
}

impl ArtifactSink for FsSink {
    #[tracing::instrument(level = "trace", skip(self, content), fields(bytes = content.len()))]
    fn write(&mut self, path: &str, content: &str) -> Result<WriteOutcome, SinkError> {
        let full = self.resolve(path)?;
        if let Ok(existing) = fs::read(&full) {
            if existing == content.as_bytes() {
                debug!(path, "artifact unchanged, skipping write");
                return Ok(WriteOutcome::Unchanged);
            }
        }
        if let Some(dir) = full.parent() {
            fs::create_dir_all(dir).map_err(|source| SinkError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&full, content).map_err(|source| SinkError::Write {
            path: full.clone(),
            source,
        })?;
        trace!(path, "artifact written");
        Ok(WriteOutcome::Written)
    }
}

/// Keeps artifacts in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    files: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Number of writes that changed content.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, path: &str, content: &str) -> Result<WriteOutcome, SinkError> {
        if self.files.get(path).is_some_and(|old| old == content) {
            return Ok(WriteOutcome::Unchanged);
        }
        self.files.insert(path.to_string(), content.to_string());
        self.writes += 1;
        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
