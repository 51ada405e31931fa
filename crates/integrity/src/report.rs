//! Report value objects and throughput accounting.
//!
//! Reports are created once per operation, immutable after construction,
//! and serialize to plain JSON-compatible structures for logging and
//! telemetry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bytes per MiB.
const MIB: f64 = 1_048_576.0;

/// Minimum elapsed time used in throughput math.
///
/// Sub-microsecond validations (tiny or cached inputs) floor to this value
/// so `throughput_mbps` is always finite.
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// Validation algorithm chosen for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Full bounded-chunk pass over every byte.
    FullStream,
    /// Head + tail windows + size; approximate identity.
    Fingerprint,
    /// Whole file read into memory in one call (small inputs only).
    FullBufferRead,
}

/// Declared purpose of a validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    /// Real-time validation of an incoming upload.
    Upload,
    /// Cache-invalidation fingerprinting.
    CacheCheck,
    /// Forensic full-hash audit.
    SecurityAudit,
    /// High-volume telemetry sampling.
    Telemetry,
}

/// Result of a full validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Source identifier (real path or stream label).
    pub file_path: String,
    pub calculated_crc: u32,
    pub strategy: Strategy,
    pub bytes_processed: u64,
    pub duration_ms: f64,
    /// Always finite and >= 0.
    pub throughput_mbps: f64,
    /// Peak resident buffer size. For `FullStream` this is the fixed
    /// chunk buffer, independent of input size.
    pub memory_usage_mb: f64,
}

/// Result of a fingerprint pass.
///
/// The checksum covers `head ++ tail ++ size_le`, so two files with the
/// same head and tail but different lengths never collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintReport {
    pub crc32: u32,
    pub strategy: Strategy,
    pub latency_ms: f64,
}

/// Computes throughput in MiB/s with a floored denominator.
///
/// Zero-duration and zero-byte inputs yield 0.0, never NaN or infinity.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(MIN_ELAPSED_SECS);
    (bytes as f64 / MIB) / secs
}

/// Converts a byte count to MiB for memory reporting.
pub(crate) fn bytes_to_mb(bytes: usize) -> f64 {
    bytes as f64 / MIB
}
