//! Fast approximate content identity from bounded head/tail windows.

use std::io::SeekFrom;
use std::path::Path;
use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::checksum::Crc32Accumulator;
use crate::error::ValidationError;
use crate::report::{FingerprintReport, Strategy};

/// Default head and tail window size: 64 KiB.
pub const DEFAULT_WINDOW_BYTES: usize = 64 * 1024;

/// Produces a fingerprint from two bounded windows plus the total size.
///
/// Reads the first `head_window` bytes and the last `tail_window` bytes of
/// a file (never the middle) and checksums `head ++ tail ++ size_le`.
/// The 8-byte little-endian size means two files with identical head and
/// tail but different lengths never collide.
///
/// This is an **approximate identity**: a change confined to the middle of
/// a file larger than both windows does not necessarily change the
/// fingerprint. Suitable for cache keys and fast rejection only; anything
/// correctness-critical must take the full [`StreamValidator`] pass.
///
/// [`StreamValidator`]: crate::StreamValidator
pub struct Fingerprinter {
    head_window: usize,
    tail_window: usize,
}

impl Fingerprinter {
    /// Creates a fingerprinter with the given window sizes.
    ///
    /// `None` defaults to [`DEFAULT_WINDOW_BYTES`] (64 KiB) per window.
    pub fn new(head_window: Option<usize>, tail_window: Option<usize>) -> Self {
        Self {
            head_window: head_window.unwrap_or(DEFAULT_WINDOW_BYTES),
            tail_window: tail_window.unwrap_or(DEFAULT_WINDOW_BYTES),
        }
    }

    /// Combined head + tail window footprint in bytes.
    pub fn window_bytes(&self) -> usize {
        self.head_window + self.tail_window
    }

    /// Fingerprints a file.
    ///
    /// The head window covers at most the whole file; the tail window is
    /// clamped to the bytes after the head, so the two windows never
    /// overlap and files smaller than `head + tail` are covered exactly
    /// once.
    pub async fn fingerprint_file(
        &self,
        path: &Path,
    ) -> Result<FingerprintReport, ValidationError> {
        let label = path.to_string_lossy().into_owned();
        let started = Instant::now();

        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ValidationError::NotFound {
                    path: label.clone(),
                }
            } else {
                ValidationError::ReadFailure {
                    path: label.clone(),
                    source: e,
                }
            }
        })?;
        let size = meta.len();
        if size == 0 {
            return Err(ValidationError::EmptyFile { path: label });
        }

        let read_err = |e| ValidationError::ReadFailure {
            path: label.clone(),
            source: e,
        };

        let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;

        let head_len = (self.head_window as u64).min(size) as usize;
        let tail_len = (self.tail_window as u64).min(size - head_len as u64) as usize;

        let mut head = vec![0u8; head_len];
        file.read_exact(&mut head).await.map_err(read_err)?;

        let mut acc = Crc32Accumulator::new();
        acc.update(&head);

        if tail_len > 0 {
            let mut tail = vec![0u8; tail_len];
            file.seek(SeekFrom::End(-(tail_len as i64)))
                .await
                .map_err(read_err)?;
            file.read_exact(&mut tail).await.map_err(read_err)?;
            acc.update(&tail);
        }

        acc.update(&size.to_le_bytes());

        let report = FingerprintReport {
            crc32: acc.finalize(),
            strategy: Strategy::Fingerprint,
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(path = %label, crc = report.crc32, size, "fingerprint complete");
        Ok(report)
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(None, None)
    }
}
