//! Error types for upload handling.

use packdock_integrity::ValidationError;

/// Reason a declared filename was rejected.
///
/// One variant per rule so callers can log which check matched. Rules run
/// in a fixed order; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("filename is empty")]
    Empty,

    #[error("filename contains a null or control byte")]
    ControlByte,

    #[error("path traversal in filename: {0}")]
    PathTraversal(String),

    #[error("path separator in filename: {0}")]
    PathSeparator(String),

    #[error("drive prefix in filename: {0}")]
    DrivePrefix(String),

    #[error("percent-encoded control sequence in filename: {0}")]
    EncodedControl(String),

    #[error("reserved device name: {0}")]
    ReservedName(String),

    #[error("shell metacharacter {0:?} in filename")]
    ShellMetacharacter(String),
}

/// Errors produced by the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("filename rejected: {0}")]
    FilenameRejected(#[from] FilenameError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("write failed for {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("size mismatch for {filename}: declared {declared} bytes, received {received}")]
    SizeMismatch {
        filename: String,
        declared: u64,
        received: u64,
    },
}
