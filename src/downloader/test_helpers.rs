//! Shared test helpers for creating VideoDownloader instances in tests.

use crate::config::Config;
use crate::downloader::VideoDownloader;
use crate::error::ExtractError;
use crate::extractor::{DownloadRequest, DownloadedVideo, Extractor, VideoInfo};
use crate::types::{Task, TaskId};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// What the scripted extractor does once it is allowed to proceed
#[derive(Debug, Clone)]
pub(crate) enum MockOutcome {
    /// Write `payload` to `<dir>/<stem>.mp4` and report `title`
    Succeed { title: String, payload: Vec<u8> },
    /// Report an IP block
    Block,
    /// Report an extractor failure with this message
    Fail(String),
    /// Panic with this message
    Panic(String),
}

/// Extractor with a scripted outcome and an optional gate
///
/// When gated, every download waits for one permit on `gate` before doing
/// anything, which keeps tasks in `processing` until the test releases them.
pub(crate) struct MockExtractor {
    outcome: MockOutcome,
    gate: Option<Arc<tokio::sync::Semaphore>>,
    pub(crate) calls: AtomicUsize,
    active: AtomicUsize,
    pub(crate) max_active: AtomicUsize,
}

impl MockExtractor {
    pub(crate) fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            gate: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub(crate) fn succeeding(title: &str) -> Self {
        Self::new(MockOutcome::Succeed {
            title: title.to_string(),
            payload: b"fake mp4 bytes".to_vec(),
        })
    }

    pub(crate) fn gated(mut self, gate: Arc<tokio::sync::Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedVideo, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match &self.outcome {
            MockOutcome::Succeed { title, payload } => {
                let filepath = request
                    .output_dir
                    .join(format!("{}.mp4", request.file_stem));
                tokio::fs::write(&filepath, payload).await.unwrap();
                Ok(DownloadedVideo {
                    filepath,
                    title: title.clone(),
                })
            }
            MockOutcome::Block => Err(ExtractError::Blocked {
                message: "ERROR: Your IP address is blocked from accessing this post".into(),
            }),
            MockOutcome::Fail(message) => Err(ExtractError::Failed {
                message: message.clone(),
            }),
            MockOutcome::Panic(message) => panic!("{}", message),
        }
    }

    async fn probe(&self, _url: &str, _proxy: Option<&str>) -> Result<VideoInfo, ExtractError> {
        Ok(VideoInfo {
            title: "mock".into(),
            ..Default::default()
        })
    }

    async fn download_channel(
        &self,
        _url: &str,
        _proxy: Option<&str>,
        _output_dir: &Path,
    ) -> Result<usize, ExtractError> {
        Ok(0)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a test VideoDownloader around `extractor`.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(
    extractor: Arc<MockExtractor>,
) -> (Arc<VideoDownloader>, tempfile::TempDir) {
    create_test_downloader_with(extractor, |_| {})
}

/// Like [`create_test_downloader`], with a hook to adjust the config
pub(crate) fn create_test_downloader_with(
    extractor: Arc<MockExtractor>,
    configure: impl FnOnce(&mut Config),
) -> (Arc<VideoDownloader>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    // Left uncreated so the runner's lazy directory creation is exercised
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = 3;
    configure(&mut config);

    let downloader = VideoDownloader::with_extractor(config, extractor);
    (Arc::new(downloader), temp_dir)
}

/// Poll until the task leaves `processing`, panicking after five seconds
pub(crate) async fn wait_for_terminal(downloader: &VideoDownloader, id: TaskId) -> Task {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let task = downloader.task_status(id).unwrap();
        if task.is_terminal() {
            return task;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {id} did not finish in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until `path` no longer exists, panicking after five seconds
pub(crate) async fn wait_for_removal(path: &Path) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while path.exists() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "{} was not removed in time",
            path.display()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
