//! Strategy selection and dispatch.

use std::path::Path;

use serde::Serialize;

use crate::error::ValidationError;
use crate::fingerprint::Fingerprinter;
use crate::report::{FingerprintReport, Strategy, UseCase, ValidationReport};
use crate::stream::StreamValidator;

/// Chooses a validation strategy for a file of `file_size` bytes.
///
/// The use case always wins over the size heuristic: `SecurityAudit` and
/// `Upload` take the full pass regardless of size, so correctness-critical
/// paths never downgrade to the approximate identity. The cheap use cases
/// fingerprint, except files no larger than the combined fingerprint
/// windows, where a whole-file read costs the same I/O.
pub fn select_strategy(file_size: u64, use_case: UseCase) -> Strategy {
    match use_case {
        UseCase::SecurityAudit | UseCase::Upload => Strategy::FullStream,
        UseCase::CacheCheck | UseCase::Telemetry => {
            if file_size <= 2 * crate::DEFAULT_WINDOW_BYTES as u64 {
                Strategy::FullBufferRead
            } else {
                Strategy::Fingerprint
            }
        }
    }
}

/// Report returned by [`check_path`], shaped by the selected strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityReport {
    Stream(ValidationReport),
    Fingerprint(FingerprintReport),
}

/// Selects a strategy for `path` under `use_case` and runs it.
///
/// `FullStream` and `FullBufferRead` run on `validator`; `Fingerprint`
/// runs on `fingerprinter`.
pub async fn check_path(
    path: &Path,
    use_case: UseCase,
    validator: &StreamValidator,
    fingerprinter: &Fingerprinter,
) -> Result<IntegrityReport, ValidationError> {
    let label = path.to_string_lossy().into_owned();
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ValidationError::NotFound { path: label }
        } else {
            ValidationError::ReadFailure {
                path: label,
                source: e,
            }
        }
    })?;

    match select_strategy(meta.len(), use_case) {
        Strategy::FullStream => validator
            .validate_file(path)
            .await
            .map(IntegrityReport::Stream),
        Strategy::FullBufferRead => validator
            .validate_buffered(path)
            .await
            .map(IntegrityReport::Stream),
        Strategy::Fingerprint => fingerprinter
            .fingerprint_file(path)
            .await
            .map(IntegrityReport::Fingerprint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::TempDir;

    const WINDOW: u64 = crate::DEFAULT_WINDOW_BYTES as u64;

    #[test]
    fn audit_and_upload_always_full_stream() {
        for size in [0, 1, WINDOW, 100 * WINDOW, u64::MAX] {
            assert_eq!(
                select_strategy(size, UseCase::SecurityAudit),
                Strategy::FullStream
            );
            assert_eq!(select_strategy(size, UseCase::Upload), Strategy::FullStream);
        }
    }

    #[test]
    fn cache_check_fingerprints_large_files() {
        assert_eq!(
            select_strategy(2 * WINDOW + 1, UseCase::CacheCheck),
            Strategy::Fingerprint
        );
        assert_eq!(
            select_strategy(10 * WINDOW, UseCase::Telemetry),
            Strategy::Fingerprint
        );
    }

    #[test]
    fn cache_check_buffers_window_sized_files() {
        assert_eq!(
            select_strategy(1024, UseCase::CacheCheck),
            Strategy::FullBufferRead
        );
        assert_eq!(
            select_strategy(2 * WINDOW, UseCase::Telemetry),
            Strategy::FullBufferRead
        );
    }

    #[tokio::test]
    async fn check_path_returns_matching_report_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkg.tgz");
        let data: Vec<u8> = vec![9u8; 512];
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&data)
            .unwrap();

        let validator = StreamValidator::new(None);
        let fingerprinter = Fingerprinter::default();

        let report = check_path(&path, UseCase::Upload, &validator, &fingerprinter)
            .await
            .unwrap();
        match report {
            IntegrityReport::Stream(r) => {
                assert_eq!(r.strategy, Strategy::FullStream);
                assert_eq!(r.calculated_crc, crc32fast::hash(&data));
            }
            IntegrityReport::Fingerprint(_) => panic!("upload must not fingerprint"),
        }

        // Small file under a cheap use case takes the buffered path.
        let report = check_path(&path, UseCase::CacheCheck, &validator, &fingerprinter)
            .await
            .unwrap();
        match report {
            IntegrityReport::Stream(r) => assert_eq!(r.strategy, Strategy::FullBufferRead),
            IntegrityReport::Fingerprint(_) => panic!("window-sized file should buffer"),
        }
    }

    #[tokio::test]
    async fn check_path_fingerprints_large_cache_check() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.tgz");
        let data = vec![1u8; (2 * WINDOW + 1024) as usize];
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&data)
            .unwrap();

        let validator = StreamValidator::new(None);
        let fingerprinter = Fingerprinter::default();
        let report = check_path(&path, UseCase::CacheCheck, &validator, &fingerprinter)
            .await
            .unwrap();
        assert!(matches!(report, IntegrityReport::Fingerprint(_)));
    }

    #[tokio::test]
    async fn check_path_missing_file() {
        let validator = StreamValidator::new(None);
        let fingerprinter = Fingerprinter::default();
        let err = check_path(
            Path::new("/nonexistent/pkg.tgz"),
            UseCase::Telemetry,
            &validator,
            &fingerprinter,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ValidationError::NotFound { .. }));
    }
}
