//! Shutdown coordination.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::VideoDownloader;

/// How long shutdown waits for running extractions
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl VideoDownloader {
    /// Gracefully shut down the downloader
    ///
    /// 1. Stops accepting new download requests
    /// 2. Waits for in-flight extractions to reach a terminal state, up to 30 seconds
    ///
    /// Tasks still running after the timeout are abandoned; their `yt-dlp`
    /// processes are killed when the runtime drops them.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.job_state.accepting_new.store(false, Ordering::SeqCst);
        self.job_state.jobs.close();
        tracing::info!(
            in_flight = self.job_state.jobs.len(),
            "Stopped accepting new downloads"
        );

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.job_state.jobs.wait()).await {
            Ok(()) => tracing::info!("All active downloads completed gracefully"),
            Err(_) => tracing::warn!(
                "Timeout waiting for downloads to complete, proceeding with shutdown"
            ),
        }
    }

    /// Whether new download requests are still accepted
    pub fn is_accepting(&self) -> bool {
        self.job_state.accepting_new.load(Ordering::SeqCst)
    }
}
