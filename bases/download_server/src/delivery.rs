// bases/download_server/src/delivery.rs
//!
//! Streams a finished extraction back to the client and guarantees the
//! scratch file does not outlive the response: the file is removed the
//! moment the body stream is dropped, whether the transfer completed or the
//! client went away mid-stream.

use crate::error::ApiError;
use audio_extractor::{ExtractError, ExtractedAudio};
use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// File stream that deletes its backing scratch file on drop.
struct ScratchFileStream {
    inner: ReaderStream<tokio::fs::File>,
    path: Option<PathBuf>,
}

impl Stream for ScratchFileStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for ScratchFileStream {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        remove_scratch_file(&path);
    }
}

/// Removal failure is a logged warning only; by the time cleanup runs the
/// response is already sent or has failed independently.
fn remove_scratch_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "scratch file removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(path = %path.display(), error = %err, "scratch file cleanup failed")
        }
    }
}

/// Build the streaming response for a finished extraction.
pub async fn audio_response(extracted: ExtractedAudio) -> Result<Response, ApiError> {
    let file = match tokio::fs::File::open(&extracted.path).await {
        Ok(file) => file,
        Err(err) => {
            // The extraction left a file we now cannot serve; it must not
            // outlive the request either.
            remove_scratch_file(&extracted.path);
            return Err(ApiError::Extract(ExtractError::Io(err)));
        }
    };

    let stream = ScratchFileStream {
        inner: ReaderStream::new(file),
        path: Some(extracted.path),
    };

    let headers = [
        (header::CONTENT_TYPE, "audio/mpeg".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", extracted.file_name),
        ),
    ];

    Ok((headers, Body::from_stream(stream)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn extracted_fixture(dir: &TempDir, payload: &[u8]) -> ExtractedAudio {
        let path = dir.path().join("track.mp3");
        tokio::fs::write(&path, payload).await.unwrap();
        ExtractedAudio {
            path,
            file_name: "track.mp3".to_string(),
        }
    }

    #[tokio::test]
    async fn streams_file_and_removes_it_after_transfer() {
        let dir = TempDir::new().unwrap();
        let extracted = extracted_fixture(&dir, b"0123456789").await;
        let path = extracted.path.clone();

        let response = audio_response(extracted).await.unwrap();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        assert_eq!(body.as_ref(), b"0123456789");
        assert!(disposition.ends_with(".mp3\""));
        assert!(!path.exists(), "scratch file should be gone after transfer");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn open_failure_removes_the_scratch_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loop.mp3");
        // A symlink to itself exists on disk but can never be opened.
        std::os::unix::fs::symlink(&path, &path).unwrap();
        let extracted = ExtractedAudio {
            path: path.clone(),
            file_name: "loop.mp3".to_string(),
        };

        let result = audio_response(extracted).await;

        assert!(result.is_err());
        assert!(
            std::fs::symlink_metadata(&path).is_err(),
            "unservable scratch entry should be removed"
        );
    }

    #[tokio::test]
    async fn removes_file_when_client_aborts_before_reading() {
        let dir = TempDir::new().unwrap();
        let extracted = extracted_fixture(&dir, b"abandoned").await;
        let path = extracted.path.clone();

        let response = audio_response(extracted).await.unwrap();
        drop(response);

        assert!(!path.exists(), "scratch file should be gone after an abort");
    }
}
