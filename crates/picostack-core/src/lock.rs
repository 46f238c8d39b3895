use crate::error::{LifecycleError, Result};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::time::SystemTime;

/// A file whose existence marks that the daemon has been managed on this host.
///
/// This is not a lock: nothing checks it and nothing holds it. `ensure` is a
/// plain touch. If mutual exclusion is ever needed it must be built on an
/// exclusive create or an advisory lock, not on this marker.
#[derive(Debug, Clone)]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the marker if absent, otherwise bump its modification time.
    /// Existing content is never read or truncated.
    pub fn ensure(&self) -> Result<()> {
        self.touch().map_err(|source| LifecycleError::LockMarker {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "lock marker ensured");
        Ok(())
    }

    fn touch(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.set_modified(SystemTime::now())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
