//! End-to-end upload pipeline.
//!
//! An upload runs `Received → FilenameValidated → Quarantined → Validated
//! → Promoted`; failure at any step rejects the upload and deletes the
//! quarantined temp file. The incoming stream is checksummed while it is
//! written in a single pass; the file is never re-read from disk.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use packdock_integrity::{
    Crc32Accumulator, DEFAULT_CHUNK_SIZE, ValidationError, throughput_mbps,
};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::filename::validate_filename;
use crate::progress::{ProgressCallback, SpeedWindow, UploadProgress};
use crate::quarantine::QuarantineFile;

/// Checksum recorded for a promoted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    /// Always `"crc32"`.
    pub algorithm: String,
    pub crc32: u32,
}

/// Result of a successfully promoted upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Final, validated destination path.
    pub path: String,
    pub integrity: Integrity,
    pub throughput_mbps: f64,
}

/// Receives uploads into quarantine and promotes them once validated.
///
/// Each call to [`handle_upload`](Self::handle_upload) is an independent
/// operation with its own accumulator, chunk buffer and uuid-named temp
/// file; a handler may serve concurrent uploads. The quarantine directory
/// must not be publicly addressable; files only become visible at the
/// final path, after validation, via atomic rename.
pub struct UploadHandler {
    final_dir: PathBuf,
    quarantine_dir: PathBuf,
    chunk_size: usize,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
}

impl UploadHandler {
    /// Creates a handler promoting into `final_dir`, staging in
    /// `quarantine_dir`. Both directories are created on first use.
    pub fn new(final_dir: impl Into<PathBuf>, quarantine_dir: impl Into<PathBuf>) -> Self {
        Self {
            final_dir: final_dir.into(),
            quarantine_dir: quarantine_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: CancellationToken::new(),
            on_progress: None,
        }
    }

    /// Overrides the chunk size (default 1 MiB).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Attaches a cancellation token checked between chunk reads.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Registers a per-chunk progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Runs one upload end to end.
    ///
    /// `declared_size` is caller-supplied metadata; when present, a
    /// mismatch against the bytes actually received rejects the upload
    /// (truncated or over-long transfer). A rejected upload leaves no
    /// file at the final destination and no temp file in quarantine.
    pub async fn handle_upload<R>(
        &self,
        mut stream: R,
        declared_filename: &str,
        declared_size: Option<u64>,
    ) -> Result<UploadResult, UploadError>
    where
        R: AsyncRead + Unpin,
    {
        debug!(filename = declared_filename, ?declared_size, "upload received");
        validate_filename(declared_filename)?;

        for dir in [&self.quarantine_dir, &self.final_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| write_failure(dir, e))?;
        }

        let quarantine = QuarantineFile::new_in(&self.quarantine_dir);
        debug!(
            filename = declared_filename,
            temp = %quarantine.path().display(),
            "upload quarantined"
        );

        let started = Instant::now();
        let received = self
            .receive(&mut stream, &quarantine, declared_filename, declared_size)
            .await;
        let (crc32, bytes_received) = match received {
            Ok(v) => v,
            Err(e) => {
                quarantine.discard().await;
                return Err(e);
            }
        };
        let elapsed = started.elapsed();

        if let Some(declared) = declared_size {
            if declared != bytes_received {
                quarantine.discard().await;
                return Err(UploadError::SizeMismatch {
                    filename: declared_filename.into(),
                    declared,
                    received: bytes_received,
                });
            }
        }
        debug!(filename = declared_filename, bytes = bytes_received, "upload validated");

        // Rename, not copy: promotion must not cost a second full-size pass.
        let final_path = self.final_dir.join(declared_filename);
        quarantine
            .promote(&final_path)
            .await
            .map_err(|e| write_failure(&final_path, e))?;

        info!(
            filename = declared_filename,
            crc32,
            bytes = bytes_received,
            "upload promoted"
        );
        Ok(UploadResult {
            path: final_path.to_string_lossy().into_owned(),
            integrity: Integrity {
                algorithm: "crc32".into(),
                crc32,
            },
            throughput_mbps: throughput_mbps(bytes_received, elapsed),
        })
    }

    /// Streams the upload into quarantine, checksumming each chunk as it
    /// is written. Returns the final CRC32 and byte count.
    async fn receive<R>(
        &self,
        stream: &mut R,
        quarantine: &QuarantineFile,
        filename: &str,
        declared_size: Option<u64>,
    ) -> Result<(u32, u64), UploadError>
    where
        R: AsyncRead + Unpin,
    {
        let mut file = tokio::fs::File::create(quarantine.path())
            .await
            .map_err(|e| write_failure(quarantine.path(), e))?;

        let mut acc = Crc32Accumulator::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut bytes_received: u64 = 0;
        let mut speed = SpeedWindow::new(None, None);

        loop {
            // Checked between chunks, never mid-chunk.
            if self.cancel.is_cancelled() {
                return Err(ValidationError::Cancelled {
                    path: filename.into(),
                }
                .into());
            }

            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| ValidationError::ReadFailure {
                    path: filename.into(),
                    source: e,
                })?;
            if n == 0 {
                break;
            }

            acc.update(&buf[..n]);
            file.write_all(&buf[..n])
                .await
                .map_err(|e| write_failure(quarantine.path(), e))?;
            bytes_received += n as u64;
            speed.record(n as u64);

            if let Some(cb) = &self.on_progress {
                cb(UploadProgress {
                    filename: filename.into(),
                    bytes_received,
                    declared_size,
                    bytes_per_second: speed.bytes_per_second(),
                });
            }
        }

        if bytes_received == 0 {
            return Err(ValidationError::EmptyFile {
                path: filename.into(),
            }
            .into());
        }

        file.flush()
            .await
            .map_err(|e| write_failure(quarantine.path(), e))?;

        Ok((acc.finalize(), bytes_received))
    }
}

fn write_failure(path: &Path, source: std::io::Error) -> UploadError {
    UploadError::WriteFailure {
        path: path.display().to_string(),
        source,
    }
}
