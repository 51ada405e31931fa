//! End-to-end upload pipeline tests: round-trip integrity, atomic
//! rejection, and cleanup on every failure path.

use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

use packdock_integrity::ValidationError;
use packdock_upload::{UploadError, UploadHandler};

use tempfile::TempDir;

fn handler(dir: &TempDir) -> UploadHandler {
    UploadHandler::new(dir.path().join("final"), dir.path().join("quarantine"))
}

fn quarantine_is_empty(dir: &TempDir) -> bool {
    let quarantine = dir.path().join("quarantine");
    !quarantine.exists() || std::fs::read_dir(quarantine).unwrap().next().is_none()
}

/// Yields one chunk of data, then fails like a dropped connection.
struct FailingReader {
    sent: bool,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.sent {
            return Poll::Ready(Err(std::io::Error::other("connection reset")));
        }
        self.sent = true;
        buf.put_slice(b"partial data before the failure");
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn roundtrip_crc_matches_out_of_band_checksum() {
    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (0..=255u8).cycle().take(300_000).collect();

    // Small chunks so the upload crosses many boundaries.
    let h = handler(&dir).with_chunk_size(4096);
    let result = h
        .handle_upload(
            Cursor::new(data.clone()),
            "my-package-1.2.3.tgz",
            Some(data.len() as u64),
        )
        .await
        .unwrap();

    // Independently re-read the promoted file and checksum it out-of-band.
    let promoted = std::fs::read(&result.path).unwrap();
    assert_eq!(promoted, data);
    assert_eq!(crc32fast::hash(&promoted), result.integrity.crc32);
    assert_eq!(result.integrity.algorithm, "crc32");
    assert!(result.throughput_mbps.is_finite());
    assert!(quarantine_is_empty(&dir));
}

#[tokio::test]
async fn size_mismatch_is_rejected_atomically() {
    let dir = TempDir::new().unwrap();
    let h = handler(&dir);

    let err = h
        .handle_upload(Cursor::new(b"short".to_vec()), "pkg.tgz", Some(999))
        .await
        .unwrap_err();
    match err {
        UploadError::SizeMismatch {
            declared, received, ..
        } => {
            assert_eq!(declared, 999);
            assert_eq!(received, 5);
        }
        other => panic!("expected SizeMismatch, got {other:?}"),
    }

    // No file at the final destination, no leaked temp.
    assert!(!dir.path().join("final").join("pkg.tgz").exists());
    assert!(quarantine_is_empty(&dir));
}

#[tokio::test]
async fn read_failure_mid_stream_cleans_quarantine() {
    let dir = TempDir::new().unwrap();
    let h = handler(&dir);

    let err = h
        .handle_upload(FailingReader { sent: false }, "pkg.tgz", None)
        .await
        .unwrap_err();
    match err {
        UploadError::Validation(ValidationError::ReadFailure { path, .. }) => {
            assert_eq!(path, "pkg.tgz");
        }
        other => panic!("expected ReadFailure, got {other:?}"),
    }

    assert!(!dir.path().join("final").join("pkg.tgz").exists());
    assert!(quarantine_is_empty(&dir));
}

#[tokio::test]
async fn cancelled_upload_cleans_quarantine() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let h = handler(&dir).with_cancellation(cancel);

    let err = h
        .handle_upload(Cursor::new(vec![1u8; 4096]), "pkg.tgz", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::Cancelled { .. })
    ));

    assert!(!dir.path().join("final").join("pkg.tgz").exists());
    assert!(quarantine_is_empty(&dir));
}

#[tokio::test]
async fn concurrent_uploads_never_contend() {
    let dir = TempDir::new().unwrap();
    let h = Arc::new(handler(&dir).with_chunk_size(512));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let h = Arc::clone(&h);
        tasks.push(tokio::spawn(async move {
            let data = vec![i as u8; 10_000 + i * 100];
            let name = format!("artifact-{i}.tgz");
            let result = h
                .handle_upload(Cursor::new(data.clone()), &name, Some(data.len() as u64))
                .await
                .unwrap();
            (result, data)
        }));
    }

    for task in tasks {
        let (result, data) = task.await.unwrap();
        let promoted = std::fs::read(&result.path).unwrap();
        assert_eq!(promoted, data);
        assert_eq!(crc32fast::hash(&promoted), result.integrity.crc32);
    }
    assert!(quarantine_is_empty(&dir));
}

#[tokio::test]
async fn empty_declared_size_zero_reports_empty_not_mismatch() {
    let dir = TempDir::new().unwrap();
    let h = handler(&dir);

    let err = h
        .handle_upload(Cursor::new(Vec::new()), "pkg.tgz", Some(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::EmptyFile { .. })
    ));
}
