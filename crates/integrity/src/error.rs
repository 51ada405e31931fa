//! Error types for validation and fingerprinting.

/// Errors produced by the integrity engine.
///
/// Every variant names the source (path or stream label) so callers never
/// see a bare I/O error without context. Missing and empty sources are
/// expected conditions and surface here as values, not panics.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("source not found: {path}")]
    NotFound { path: String },

    #[error("source is empty: {path}")]
    EmptyFile { path: String },

    #[error("read failed for {path}: {source}")]
    ReadFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("validation cancelled: {path}")]
    Cancelled { path: String },
}

impl ValidationError {
    /// The source identifier the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::EmptyFile { path }
            | Self::ReadFailure { path, .. }
            | Self::Cancelled { path } => path,
        }
    }
}
