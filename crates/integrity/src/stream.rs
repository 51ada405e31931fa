//! Full-pass streaming validation with bounded memory.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::DEFAULT_CHUNK_SIZE;
use crate::checksum::Crc32Accumulator;
use crate::error::ValidationError;
use crate::report::{Strategy, ValidationReport, bytes_to_mb, throughput_mbps};

/// Validates byte sources one bounded chunk at a time.
///
/// One chunk buffer of `chunk_size` bytes is the entire resident footprint
/// of a validation, regardless of input size. Each call creates a fresh
/// [`Crc32Accumulator`]; nothing is shared between operations.
///
/// The chunk read is the only suspension point. Cancellation is checked
/// between reads, never mid-chunk; a cancelled validation returns
/// [`ValidationError::Cancelled`] and releases the source.
pub struct StreamValidator {
    chunk_size: usize,
    cancel: CancellationToken,
}

impl StreamValidator {
    /// Creates a validator with the given chunk size.
    ///
    /// If `chunk_size` is `None`, [`DEFAULT_CHUNK_SIZE`] (1 MiB) is used.
    pub fn new(chunk_size: Option<usize>) -> Self {
        Self::with_cancellation(chunk_size, CancellationToken::new())
    }

    /// Creates a validator whose chunk loop observes `cancel`.
    pub fn with_cancellation(chunk_size: Option<usize>, cancel: CancellationToken) -> Self {
        Self {
            chunk_size: chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            cancel,
        }
    }

    /// Configured chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Validates a file with the `FullStream` strategy.
    ///
    /// Missing files and zero-length files are rejected before the file is
    /// opened. The handle is released on every exit path.
    pub async fn validate_file(&self, path: &Path) -> Result<ValidationReport, ValidationError> {
        let label = path.to_string_lossy().into_owned();

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| map_open_error(&label, e))?;
        if meta.len() == 0 {
            return Err(ValidationError::EmptyFile { path: label });
        }

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| map_open_error(&label, e))?;
        self.validate_reader(&label, file).await
    }

    /// Validates any sequential byte source with the `FullStream` strategy.
    ///
    /// Sources without a known size are rejected post-hoc: end-of-stream
    /// before any byte was read returns [`ValidationError::EmptyFile`].
    /// `label` identifies the source in the report and in errors.
    pub async fn validate_reader<R>(
        &self,
        label: &str,
        mut reader: R,
    ) -> Result<ValidationReport, ValidationError>
    where
        R: AsyncRead + Unpin,
    {
        let started = Instant::now();
        let mut acc = Crc32Accumulator::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut bytes_processed: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ValidationError::Cancelled { path: label.into() });
            }

            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| ValidationError::ReadFailure {
                    path: label.into(),
                    source: e,
                })?;
            if n == 0 {
                break;
            }

            acc.update(&buf[..n]);
            bytes_processed += n as u64;
        }

        if bytes_processed == 0 {
            return Err(ValidationError::EmptyFile { path: label.into() });
        }

        let elapsed = started.elapsed();
        let report = ValidationReport {
            file_path: label.into(),
            calculated_crc: acc.finalize(),
            strategy: Strategy::FullStream,
            bytes_processed,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            throughput_mbps: throughput_mbps(bytes_processed, elapsed),
            memory_usage_mb: bytes_to_mb(self.chunk_size),
        };
        debug!(
            path = label,
            crc = report.calculated_crc,
            bytes = bytes_processed,
            "stream validation complete"
        );
        Ok(report)
    }

    /// Validates a file with the `FullBufferRead` strategy.
    ///
    /// Reads the whole file into memory in one call. Reported memory usage
    /// equals the file size, so this is only selected for inputs small
    /// enough that a fingerprint would read every byte anyway.
    pub async fn validate_buffered(
        &self,
        path: &Path,
    ) -> Result<ValidationReport, ValidationError> {
        let label = path.to_string_lossy().into_owned();
        let started = Instant::now();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| map_open_error(&label, e))?;
        if data.is_empty() {
            return Err(ValidationError::EmptyFile { path: label });
        }

        let mut acc = Crc32Accumulator::new();
        acc.update(&data);

        let elapsed = started.elapsed();
        Ok(ValidationReport {
            file_path: label,
            calculated_crc: acc.finalize(),
            strategy: Strategy::FullBufferRead,
            bytes_processed: data.len() as u64,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            throughput_mbps: throughput_mbps(data.len() as u64, elapsed),
            memory_usage_mb: bytes_to_mb(data.len()),
        })
    }
}

fn map_open_error(label: &str, e: std::io::Error) -> ValidationError {
    if e.kind() == ErrorKind::NotFound {
        ValidationError::NotFound { path: label.into() }
    } else {
        ValidationError::ReadFailure {
            path: label.into(),
            source: e,
        }
    }
}
