//! Job runner: drives one task from `processing` to a terminal state.

use crate::error::ExtractError;
use crate::extractor::{DownloadRequest, DownloadedVideo};
use crate::types::TaskId;
use crate::utils::ensure_dir;
use std::any::Any;

use super::VideoDownloader;

impl VideoDownloader {
    /// Spawn the background job for a freshly created task
    ///
    /// The job waits for a concurrency permit, then runs the extraction in
    /// its own Tokio task so that a panic inside the extractor is observed
    /// here as a `JoinError` and recorded instead of leaving the task stuck.
    pub(crate) fn spawn_job(&self, id: TaskId, url: String) {
        let downloader = self.clone();
        self.job_state.jobs.spawn(async move {
            downloader.run_job(id, url).await;
        });
    }

    async fn run_job(&self, id: TaskId, url: String) {
        // Acquire a permit from the semaphore (waits if at max concurrent extractions)
        let _permit = match self.job_state.concurrent_limit.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.record(
                    id,
                    Err(ExtractError::Internal {
                        message: "job runner is shut down".to_string(),
                    }),
                );
                return;
            }
        };

        let outcome = self.extract(id, url).await;
        self.record(id, outcome);
    }

    async fn extract(&self, id: TaskId, url: String) -> Result<DownloadedVideo, ExtractError> {
        let output_dir = self.config.download_dir().clone();
        ensure_dir(&output_dir)
            .await
            .map_err(|e| ExtractError::Internal {
                message: format!(
                    "failed to create download directory '{}': {}",
                    output_dir.display(),
                    e
                ),
            })?;

        let request = DownloadRequest {
            url,
            proxy: self.config.extractor.proxy.clone(),
            output_dir,
            file_stem: id.to_string(),
        };

        tracing::debug!(task_id = %id, extractor = self.extractor.name(), "Extraction started");

        let extractor = self.extractor.clone();
        let handle = tokio::spawn(async move { extractor.download(&request).await });

        match handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => Err(ExtractError::Internal {
                message: panic_message(join_error.into_panic()),
            }),
            Err(join_error) => Err(ExtractError::Internal {
                message: join_error.to_string(),
            }),
        }
    }

    fn record(&self, id: TaskId, outcome: Result<DownloadedVideo, ExtractError>) {
        let elapsed_secs = self
            .store
            .created_at(id)
            .map(|created_at| (chrono::Utc::now() - created_at).num_milliseconds() as f64 / 1000.0)
            .unwrap_or_default();

        let written = match outcome {
            Ok(video) => {
                tracing::info!(
                    task_id = %id,
                    title = %video.title,
                    path = %video.filepath.display(),
                    elapsed_secs,
                    "Download complete"
                );
                self.store.set_complete(id, video.filepath, video.title)
            }
            Err(e) => {
                match &e {
                    ExtractError::Internal { .. } => {
                        tracing::error!(task_id = %id, elapsed_secs, error = %e, "Download failed unexpectedly")
                    }
                    _ => tracing::warn!(
                        task_id = %id,
                        elapsed_secs,
                        code = %e.code(),
                        error = %e,
                        "Download failed"
                    ),
                }
                self.store.set_failed(id, e.task_error())
            }
        };

        if let Err(e) = written {
            tracing::error!(task_id = %id, error = %e, "Failed to record task outcome");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "extractor panicked".to_string()
    }
}
