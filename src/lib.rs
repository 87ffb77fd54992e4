//! # shortvid-dl
//!
//! Short-video download service: submit a page URL, poll the background
//! task, then stream the finished video exactly once.
//!
//! ## Design Philosophy
//!
//! - **Asynchronous** - Requests return immediately; extraction runs in the background
//! - **Single delivery** - A finished file is streamed once and then removed from disk
//! - **Pluggable extraction** - `yt-dlp` by default, any [`Extractor`] in tests or embedders
//! - **Sensible defaults** - Works out of the box with zero configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use shortvid_dl::{Config, VideoDownloader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Arc::new(VideoDownloader::new(Config::default())?);
//!
//!     let task_id = downloader.request_download("https://www.tiktok.com/@user/video/123")?;
//!     println!("task {task_id}: {:?}", downloader.task_status(task_id)?);
//!
//!     // Serve the HTTP API until SIGINT/SIGTERM
//!     shortvid_dl::run_with_shutdown(downloader).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Video extraction backends
pub mod extractor;
/// In-memory task store
pub mod store;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use downloader::VideoDownloader;
pub use error::{ApiError, Error, ErrorDetail, ExtractError, Result, TaskError, ToHttpStatus};
pub use extractor::{Extractor, ProxyUrl, VideoInfo, YtDlpExtractor};
pub use store::TaskStore;
pub use types::{ErrorCode, Task, TaskId, TaskStatus};

/// Serve the API until a termination signal arrives, then shut down gracefully.
///
/// Stops accepting connections on the signal, lets in-flight responses
/// finish, then waits for running extractions via
/// [`VideoDownloader::shutdown`].
///
/// On Unix this is SIGTERM or SIGINT; elsewhere Ctrl+C.
pub async fn run_with_shutdown(downloader: std::sync::Arc<VideoDownloader>) -> Result<()> {
    let config = downloader.get_config();
    api::serve_until(downloader.clone(), config, wait_for_signal()).await?;
    downloader.shutdown().await;
    Ok(())
}

/// Resolve on SIGTERM or SIGINT
///
/// Either handler may fail to register (some sandboxes forbid it); the other
/// one is used alone, and `ctrl_c` is the last resort.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    async fn recv_logged(mut stream: Signal, name: &str) {
        stream.recv().await;
        tracing::info!(signal = name, "Stopping shortvid-dl");
    }

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => {
            tokio::select! {
                _ = recv_logged(term, "SIGTERM") => {}
                _ = recv_logged(int, "SIGINT") => {}
            }
        }
        (Ok(only), Err(e)) | (Err(e), Ok(only)) => {
            tracing::warn!(error = %e, "Signal handler unavailable, listening on the remaining one");
            recv_logged(only, "SIGTERM/SIGINT").await;
        }
        (Err(e), Err(_)) => {
            tracing::warn!(error = %e, "No signal handlers available, falling back to ctrl_c");
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(signal = "ctrl_c", "Stopping shortvid-dl");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C; serving until the process is killed");
        std::future::pending::<()>().await;
    }
    tracing::info!(signal = "ctrl_c", "Stopping shortvid-dl");
}
