//! One-time delivery of finished artifacts.
//!
//! A completed task's file is handed out exactly once. The file is opened
//! first and the store then records the claim atomically, and the returned [`DeliveryStream`] owns the file: when
//! the stream is dropped (fully sent, client gone, or response discarded) the
//! file is removed from disk.

use crate::error::{Error, Result, TaskError};
use crate::types::TaskId;
use crate::utils::delivered_filename;
use axum::body::Bytes;
use futures::Stream;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::VideoDownloader;

/// A claimed artifact ready to be streamed to one client
#[derive(Debug)]
pub struct Delivery {
    /// Filename presented to the client (`<sanitized title>.mp4`)
    pub filename: String,
    /// Size of the artifact in bytes, if known
    pub content_length: Option<u64>,
    /// File contents; removes the file when dropped
    pub body: DeliveryStream,
}

/// Byte stream over an artifact that deletes the file when dropped
#[derive(Debug)]
pub struct DeliveryStream {
    inner: ReaderStream<File>,
    _cleanup: ArtifactCleanup,
}

impl Stream for DeliveryStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Removes the artifact when dropped
#[derive(Debug)]
struct ArtifactCleanup {
    task_id: TaskId,
    path: PathBuf,
}

impl Drop for ArtifactCleanup {
    fn drop(&mut self) {
        let task_id = self.task_id;
        let path = std::mem::take(&mut self.path);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    log_removal(task_id, &path, tokio::fs::remove_file(&path).await);
                });
            }
            Err(_) => {
                let result = std::fs::remove_file(&path);
                log_removal(task_id, &path, result);
            }
        }
    }
}

fn log_removal(task_id: TaskId, path: &std::path::Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::info!(task_id = %task_id, path = %path.display(), "Removed delivered file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(task_id = %task_id, path = %path.display(), "Delivered file already gone")
        }
        Err(e) => tracing::warn!(
            task_id = %task_id,
            path = %path.display(),
            error = %e,
            "Failed to remove delivered file"
        ),
    }
}

impl VideoDownloader {
    /// Claim a completed task's artifact for streaming
    ///
    /// Succeeds at most once per task. The returned stream deletes the file
    /// when it is dropped, whether or not the client read it to the end.
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] for unknown ids
    /// - [`TaskError::NotReady`] while the task is still processing
    /// - [`TaskError::NotComplete`] for failed tasks
    /// - [`TaskError::AlreadyDelivered`] on the second attempt
    /// - [`TaskError::FileMissing`] if the artifact vanished from disk
    pub async fn open_delivery(&self, id: TaskId) -> Result<Delivery> {
        // Open before claiming so a failed open leaves the delivery available
        let target = self.store.peek_delivery(id)?;
        let file = match File::open(&target.filepath).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(task_id = %id, path = %target.filepath.display(), "Downloaded file not found on server");
                return Err(TaskError::FileMissing {
                    id,
                    path: target.filepath,
                }
                .into());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let content_length = file.metadata().await.ok().map(|m| m.len());

        // A concurrent request may have won the claim while we were opening
        let claim = self.store.claim_delivery(id)?;
        let cleanup = ArtifactCleanup {
            task_id: id,
            path: claim.filepath.clone(),
        };

        let waited = chrono::Utc::now().signed_duration_since(claim.finished_at);
        tracing::info!(
            task_id = %id,
            title = %claim.title,
            finished_at = %claim.finished_at,
            waited_secs = waited.num_seconds(),
            "Streaming video"
        );

        Ok(Delivery {
            filename: delivered_filename(&claim.title),
            content_length,
            body: DeliveryStream {
                inner: ReaderStream::new(file),
                _cleanup: cleanup,
            },
        })
    }
}
