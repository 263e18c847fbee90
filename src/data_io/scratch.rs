//! Scoped scratch directories for transient per-stream files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A private directory that is removed with everything inside it.
///
/// Call [`close`](Self::close) to release it and observe errors; dropping an
/// unclosed directory still removes it, logging any failure.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    closed: bool,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir.
    pub fn new(prefix: &str) -> io::Result<Self> {
        Self::new_in(std::env::temp_dir(), prefix)
    }

    pub fn new_in(parent: impl AsRef<Path>, prefix: &str) -> io::Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = parent
            .as_ref()
            .join(format!("{prefix}-{}-{nanos}-{seq}", std::process::id()));
        fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory and its contents.
    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        remove(&self.path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = remove(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove scratch directory");
            }
        }
    }
}

fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
