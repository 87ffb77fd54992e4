//! Video extraction
//!
//! The extraction itself is delegated to an external tool. This module
//! defines the [`Extractor`] seam the rest of the crate talks to, and the
//! [`YtDlpExtractor`] implementation that drives the `yt-dlp` binary.
//!
//! - [`traits`] - The `Extractor` trait and its request/result types
//! - [`ytdlp`] - `yt-dlp` process driver
//! - [`classify`] - Mapping of `yt-dlp` failures to [`ExtractError`](crate::error::ExtractError)
//! - [`proxy`] - Proxy URL validation

pub mod classify;
pub mod proxy;
pub mod traits;
pub mod ytdlp;

pub use classify::classify_failure;
pub use proxy::{InvalidProxy, ProxyUrl};
pub use traits::{DownloadRequest, DownloadedVideo, Extractor, VideoInfo};
pub use ytdlp::YtDlpExtractor;
