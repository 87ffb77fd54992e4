//! Test extractor standing in for yt-dlp

use async_trait::async_trait;
use shortvid_dl::extractor::{DownloadRequest, DownloadedVideo, VideoInfo};
use shortvid_dl::{ExtractError, Extractor};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bytes written for every successful fixture download
pub const FIXTURE_VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42 fixture video payload";

/// Extractor that writes [`FIXTURE_VIDEO`] or fails with a fixed error
pub struct FixtureExtractor {
    title: String,
    failure: Option<ExtractError>,
    gate: Option<Arc<Semaphore>>,
}

impl FixtureExtractor {
    /// Succeeds with `title`
    pub fn succeeding(title: &str) -> Self {
        Self {
            title: title.to_string(),
            failure: None,
            gate: None,
        }
    }

    /// Always fails with `error`
    pub fn failing(error: ExtractError) -> Self {
        Self {
            title: String::new(),
            failure: Some(error),
            gate: None,
        }
    }

    /// Hold every download until a permit is added to `gate`
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl Extractor for FixtureExtractor {
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedVideo, ExtractError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ExtractError::Internal {
                    message: e.to_string(),
                })?
                .forget();
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let filepath = request
            .output_dir
            .join(format!("{}.mp4", request.file_stem));
        tokio::fs::write(&filepath, FIXTURE_VIDEO)
            .await
            .map_err(|e| ExtractError::Internal {
                message: e.to_string(),
            })?;

        Ok(DownloadedVideo {
            filepath,
            title: self.title.clone(),
        })
    }

    async fn probe(&self, _url: &str, _proxy: Option<&str>) -> Result<VideoInfo, ExtractError> {
        Ok(VideoInfo {
            title: self.title.clone(),
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
        "fixture"
    }
}
