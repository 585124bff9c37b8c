//! Cleanup of files that were only partly written.

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

/// Removes the file at `path` on drop unless disarmed.
pub(crate) struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Keeps the file.
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove partial file");
            } else {
                debug!(path = %self.path.display(), "removed partial file");
            }
        }
    }
}
