//! Streaming integrity validation for uploaded artifacts.
//!
//! Computes and verifies CRC32 content checksums of artifacts ranging from
//! kilobytes to multi-gigabytes without loading whole files into memory.
//! Three strategies cover the different callers:
//!
//! - [`Strategy::FullStream`]: bounded-chunk pass over every byte
//!   ([`StreamValidator`]). Used for uploads and forensic audits.
//! - [`Strategy::Fingerprint`]: head + tail windows + size
//!   ([`Fingerprinter`]). Approximate identity for cache keys and
//!   telemetry sampling, never for correctness-critical verification.
//! - [`Strategy::FullBufferRead`]: whole-file read for inputs small enough
//!   that a fingerprint would touch every byte anyway.
//!
//! [`select_strategy`] maps a `(file size, use case)` pair onto one of the
//! three; [`check_path`] runs the selected strategy and returns the
//! matching report shape.
//!
//! Every validation owns its accumulator and chunk buffer; nothing is
//! shared across concurrent operations.

mod checksum;
mod error;
mod fingerprint;
mod report;
mod strategy;
mod stream;

pub use checksum::Crc32Accumulator;
pub use error::ValidationError;
pub use fingerprint::{DEFAULT_WINDOW_BYTES, Fingerprinter};
pub use report::{
    FingerprintReport, Strategy, UseCase, ValidationReport, throughput_mbps,
};
pub use strategy::{IntegrityReport, check_path, select_strategy};
pub use stream::StreamValidator;

/// Default chunk size for streaming validation: 1 MiB.
///
/// Each validation allocates exactly one buffer of this size regardless of
/// input length. Larger chunks reduce per-chunk overhead (CRC update,
/// syscalls) at the cost of a bigger resident buffer.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
