//! Core downloader implementation split into focused submodules.
//!
//! The `VideoDownloader` struct and its methods are organized by domain:
//! - [`runner`] - Background extraction jobs (the job runner)
//! - [`delivery`] - One-time streaming of finished artifacts with cleanup
//! - [`lifecycle`] - Graceful shutdown

mod delivery;
mod lifecycle;
mod runner;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use delivery::{Delivery, DeliveryStream};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{Extractor, YtDlpExtractor};
use crate::store::TaskStore;
use crate::types::{Task, TaskId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Job bookkeeping shared by every spawned extraction
#[derive(Clone)]
pub(crate) struct JobState {
    /// Semaphore to limit concurrent extractions (respects max_concurrent_downloads config)
    pub(crate) concurrent_limit: Arc<tokio::sync::Semaphore>,
    /// Tracks spawned jobs so shutdown can wait for them
    pub(crate) jobs: tokio_util::task::TaskTracker,
    /// Flag to indicate whether new requests are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct VideoDownloader {
    /// Task store shared between the job runner and the gateway
    pub(crate) store: Arc<TaskStore>,
    /// Extraction backend (trait object so tests can script outcomes)
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Concurrency and shutdown state for background jobs
    pub(crate) job_state: JobState,
}

impl VideoDownloader {
    /// Create a downloader backed by `yt-dlp`
    ///
    /// The binary is resolved from `extractor.ytdlp_path`, or from PATH when
    /// `extractor.search_path` is set. The download directory is not touched
    /// here; it is created lazily before each extraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid settings and
    /// [`Error::ExternalTool`] when `yt-dlp` cannot be located.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let extractor = YtDlpExtractor::from_config(&config.extractor)?;
        tracing::info!(
            extractor = extractor.name(),
            binary = %extractor.binary_path().display(),
            "Extractor initialized"
        );
        Ok(Self::with_extractor(config, Arc::new(extractor)))
    }

    /// Create a downloader around any [`Extractor`] implementation
    pub fn with_extractor(config: Config, extractor: Arc<dyn Extractor>) -> Self {
        let concurrent_limit = Arc::new(tokio::sync::Semaphore::new(
            config.download.max_concurrent_downloads.max(1),
        ));

        Self {
            store: Arc::new(TaskStore::new()),
            extractor,
            config: Arc::new(config),
            job_state: JobState {
                concurrent_limit,
                jobs: tokio_util::task::TaskTracker::new(),
                accepting_new: Arc::new(AtomicBool::new(true)),
            },
        }
    }

    /// Accept a download request and start processing it in the background
    ///
    /// Returns as soon as the task is registered; the task starts in the
    /// `processing` state and is driven to a terminal state by the job runner.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `url` is blank
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown) started
    pub fn request_download(&self, url: &str) -> Result<TaskId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("url is required".to_string()));
        }
        if !self.job_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let id = self.store.create();
        tracing::info!(task_id = %id, url, "Download requested");

        self.spawn_job(id, url.to_string());
        Ok(id)
    }

    /// Current state of a task
    pub fn task_status(&self, id: TaskId) -> Result<Task> {
        Ok(self.store.get(id)?)
    }

    /// The task store (read access for diagnostics)
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Name of the active extraction backend
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Spawn the API server in a background task
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use shortvid_dl::{Config, VideoDownloader};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = Arc::new(VideoDownloader::new(Config::default())?);
    /// let api_handle = downloader.spawn_api_server();
    /// api_handle.await??;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
