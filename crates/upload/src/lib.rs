//! End-to-end upload orchestration over the integrity engine.
//!
//! An upload moves through a fixed pipeline: the declared filename is
//! checked against traversal/device-name/metacharacter attacks, the
//! incoming stream is written to a quarantined temp file while the CRC32
//! is computed over the same bytes in a single pass, the received size is
//! checked against the declared size, and the file is atomically renamed
//! into its final location. A failed upload never leaves a file at the
//! final destination; the quarantined temp is deleted on every failure
//! path.
//!
//! Concurrent uploads are independent: each owns its accumulator, chunk
//! buffer and uuid-named temp file.

mod error;
mod filename;
mod handler;
mod progress;
mod quarantine;

pub use error::{FilenameError, UploadError};
pub use filename::validate_filename;
pub use handler::{Integrity, UploadHandler, UploadResult};
pub use progress::{ProgressCallback, SpeedWindow, UploadProgress};
pub use quarantine::QuarantineFile;
