//! Quarantined temp files with atomic promotion.

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// A temp file in the quarantine directory, owned by one upload.
///
/// The path carries a uuid-v4 suffix, so concurrent uploads never contend
/// on the same temp name. The file is promoted into its final location by
/// rename (never copy), or removed on failure; a `Drop` backstop deletes
/// any never-promoted temp so no control-flow path leaks a partial
/// artifact. Cleanup is best-effort: a failed delete is logged, not
/// escalated.
#[derive(Debug)]
pub struct QuarantineFile {
    path: PathBuf,
    needs_cleanup: bool,
}

impl QuarantineFile {
    /// Allocates a collision-free temp path inside `dir`.
    ///
    /// The file itself is created by the caller writing to
    /// [`path`](Self::path).
    pub fn new_in(dir: &Path) -> Self {
        Self {
            path: dir.join(format!(".upload-{}.part", Uuid::new_v4())),
            needs_cleanup: true,
        }
    }

    /// The quarantined temp path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically renames the temp file to `dest`.
    ///
    /// On error the guard is dropped and the temp file is removed; a
    /// failed promotion never leaves a file at the destination.
    pub async fn promote(mut self, dest: &Path) -> std::io::Result<()> {
        tokio::fs::rename(&self.path, dest).await?;
        self.needs_cleanup = false;
        Ok(())
    }

    /// Removes the temp file, best-effort.
    pub async fn discard(mut self) {
        self.needs_cleanup = false;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove quarantined file"
                );
            }
        }
    }
}

impl Drop for QuarantineFile {
    fn drop(&mut self) {
        if !self.needs_cleanup {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove quarantined file"
                );
            }
        }
    }
}
