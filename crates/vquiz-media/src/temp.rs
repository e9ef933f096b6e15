//! Scoped tracking and cleanup of transient media artifacts.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tracks every transient path produced during one pipeline run.
///
/// Invariant: every tracked path is deleted exactly once by the end of the
/// run that requested it, success or failure. Deletion is best effort;
/// cleanup must never fail the job.
#[derive(Debug, Default)]
pub struct TempResources {
    paths: Vec<PathBuf>,
}

impl TempResources {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a single path for cleanup.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Track multiple paths for cleanup.
    pub fn track_all<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
    }

    /// Number of currently tracked paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether any paths are tracked.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete all tracked paths. Failures are logged, never propagated.
    ///
    /// Consumes the tracked set, so a second call is a no-op rather than a
    /// double delete.
    pub async fn release(&mut self) {
        for path in self.paths.drain(..) {
            release_path(&path).await;
        }
    }
}

async fn release_path(path: &Path) {
    let result = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        // Already gone (or unreadable): nothing to release.
        Err(_) => return,
    };

    match result {
        Ok(()) => debug!(path = %path.display(), "Released temp resource"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to release temp resource"),
    }
}
