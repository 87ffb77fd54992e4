//! Traits and types for video extraction

use crate::error::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

/// Title used when the extractor reports none
pub const DEFAULT_TITLE: &str = "video";

/// Parameters for a single-video download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Page URL of the video
    pub url: String,
    /// Optional proxy URL passed through to the extractor
    pub proxy: Option<String>,
    /// Directory the artifact is written to
    pub output_dir: PathBuf,
    /// File name stem of the artifact; the extractor appends the extension
    pub file_stem: String,
}

/// A materialized download
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedVideo {
    /// Where the artifact was written
    pub filepath: PathBuf,
    /// Media title
    pub title: String,
}

/// Descriptive metadata returned by [`Extractor::probe`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VideoInfo {
    /// Media title
    #[serde(default = "default_title", deserialize_with = "null_as_default_title")]
    pub title: String,
    /// Uploader display name
    #[serde(default)]
    pub uploader: Option<String>,
    /// Upload date as reported by the site (YYYYMMDD)
    #[serde(default)]
    pub upload_date: Option<String>,
    /// Human readable duration (e.g. "1:05")
    #[serde(default)]
    pub duration_string: Option<String>,
    /// View count
    #[serde(default)]
    pub view_count: Option<u64>,
    /// Like count
    #[serde(default)]
    pub like_count: Option<u64>,
    /// Comment count
    #[serde(default)]
    pub comment_count: Option<u64>,
    /// Canonical page URL
    #[serde(default)]
    pub webpage_url: Option<String>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn null_as_default_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let title = Option::<String>::deserialize(deserializer)?;
    Ok(title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(default_title))
}

/// Trait for video extraction backends
///
/// Implementations perform the site-specific fetch and decode. The crate only
/// relies on the classified outcome: a file on disk plus its title, or an
/// [`ExtractError`].
///
/// # Examples
///
/// ```no_run
/// use shortvid_dl::extractor::{DownloadRequest, Extractor, YtDlpExtractor};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found in PATH");
///
/// let video = extractor
///     .download(&DownloadRequest {
///         url: "https://www.tiktok.com/@user/video/123".into(),
///         proxy: None,
///         output_dir: PathBuf::from("downloads"),
///         file_stem: "clip".into(),
///     })
///     .await?;
/// println!("{} -> {}", video.title, video.filepath.display());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Download one video into `request.output_dir`
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Blocked`] when the site blocks the client or times out
    /// - [`ExtractError::Failed`] for any other reported failure
    /// - [`ExtractError::Internal`] when the backend itself misbehaves
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedVideo, ExtractError>;

    /// Fetch metadata without downloading
    async fn probe(&self, url: &str, proxy: Option<&str>) -> Result<VideoInfo, ExtractError>;

    /// Download every video of a user page into `output_dir`, returning how many were saved
    async fn download_channel(
        &self,
        url: &str,
        proxy: Option<&str>,
        output_dir: &Path,
    ) -> Result<usize, ExtractError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
