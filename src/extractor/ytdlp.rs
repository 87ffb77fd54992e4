//! `yt-dlp` process driver

use super::classify::classify_failure;
use super::traits::{DEFAULT_TITLE, DownloadRequest, DownloadedVideo, Extractor, VideoInfo};
use crate::config::ExtractorConfig;
use crate::error::{Error, ExtractError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Format selector preferring an mp4 container with separate best streams
pub const DEFAULT_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

const NO_INFO_MESSAGE: &str = "Could not extract video information for download.";
const NO_USER_VIDEOS_MESSAGE: &str =
    "Could not find any videos for this user or extract user information.";

/// Extractor backed by the external `yt-dlp` binary
///
/// Every call spawns one `yt-dlp` process. The process is killed if the
/// returned future is dropped.
///
/// # Examples
///
/// ```no_run
/// use shortvid_dl::extractor::{Extractor, YtDlpExtractor};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
/// let info = extractor
///     .probe("https://www.tiktok.com/@user/video/123", None)
///     .await?;
/// println!("{}", info.title);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    format: String,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit binary path and the default format
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            format: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Override the format selector
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Attempt to find `yt-dlp` in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build from configuration: explicit path first, then PATH lookup if allowed
    pub fn from_config(config: &ExtractorConfig) -> crate::Result<Self> {
        let extractor = match &config.ytdlp_path {
            Some(path) => Self::new(path.clone()),
            None if config.search_path => Self::from_path().ok_or_else(|| {
                Error::ExternalTool("yt-dlp not found in PATH".to_string())
            })?,
            None => {
                return Err(Error::ExternalTool(
                    "no yt-dlp path configured and PATH search is disabled".to_string(),
                ));
            }
        };
        Ok(extractor.with_format(config.format.clone()))
    }

    /// Path of the binary this extractor runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn download_args(&self, request: &DownloadRequest) -> Vec<OsString> {
        let template = request
            .output_dir
            .join(format!("{}.%(ext)s", request.file_stem));

        let mut args: Vec<OsString> = vec![
            "--format".into(),
            self.format.clone().into(),
            "--remux-video".into(),
            "mp4".into(),
            "--no-playlist".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--output".into(),
            template.into_os_string(),
            "--print".into(),
            "title".into(),
            "--print".into(),
            "after_move:filepath".into(),
            "--no-simulate".into(),
        ];
        push_proxy(&mut args, request.proxy.as_deref());
        args.push(request.url.clone().into());
        args
    }

    fn probe_args(url: &str, proxy: Option<&str>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--dump-single-json".into(),
            "--skip-download".into(),
            "--no-playlist".into(),
            "--no-warnings".into(),
        ];
        push_proxy(&mut args, proxy);
        args.push(url.into());
        args
    }

    fn channel_args(&self, url: &str, proxy: Option<&str>, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--format".into(),
            self.format.clone().into(),
            "--remux-video".into(),
            "mp4".into(),
            "--yes-playlist".into(),
            "--ignore-errors".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--output".into(),
            output_dir.join("%(id)s.%(ext)s").into_os_string(),
            "--print".into(),
            "after_move:filepath".into(),
            "--no-simulate".into(),
        ];
        push_proxy(&mut args, proxy);
        args.push(url.into());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Output, ExtractError> {
        tracing::debug!(binary = %self.binary_path.display(), ?args, "running yt-dlp");

        Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractError::Internal {
                message: format!(
                    "failed to execute {}: {}",
                    self.binary_path.display(),
                    e
                ),
            })
    }
}

fn push_proxy(args: &mut Vec<OsString>, proxy: Option<&str>) {
    if let Some(proxy) = proxy {
        args.push("--proxy".into());
        args.push(proxy.into());
    }
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// What `--print` emits for a field the site did not provide
const MISSING_FIELD: &str = "NA";

/// Find `<stem>.<ext>` in `dir`, ignoring partial downloads
async fn locate_by_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let matches_stem = path.file_stem().and_then(|s| s.to_str()) == Some(stem);
        let partial = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "part" || e == "ytdl");
        if matches_stem && !partial && path.is_file() {
            return Some(path);
        }
    }
    None
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedVideo, ExtractError> {
        let output = self.run(self.download_args(request)).await?;
        if !output.status.success() {
            return Err(classify_failure(
                &String::from_utf8_lossy(&output.stderr),
                Some(output.status),
            ));
        }

        let lines = stdout_lines(&output);
        let Some(first) = lines.first() else {
            return Err(ExtractError::Failed {
                message: NO_INFO_MESSAGE.to_string(),
            });
        };

        // `title` is printed before the download, the final path after the remux
        let title = if (lines.len() > 1 || !Path::new(first).is_absolute())
            && first != MISSING_FIELD
        {
            first.clone()
        } else {
            DEFAULT_TITLE.to_string()
        };

        let reported = lines
            .last()
            .filter(|_| lines.len() > 1)
            .map(PathBuf::from)
            .filter(|path| path.is_file());

        let filepath = match reported {
            Some(path) => path,
            None => locate_by_stem(&request.output_dir, &request.file_stem)
                .await
                .ok_or_else(|| ExtractError::Internal {
                    message: format!(
                        "yt-dlp reported success but no file named {}.* was written",
                        request.file_stem
                    ),
                })?,
        };

        tracing::info!(
            url = %request.url,
            path = %filepath.display(),
            "yt-dlp download finished"
        );

        Ok(DownloadedVideo { filepath, title })
    }

    async fn probe(&self, url: &str, proxy: Option<&str>) -> Result<VideoInfo, ExtractError> {
        let output = self.run(Self::probe_args(url, proxy)).await?;
        if !output.status.success() {
            return Err(classify_failure(
                &String::from_utf8_lossy(&output.stderr),
                Some(output.status),
            ));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(ExtractError::Failed {
                message: "Could not extract video information.".to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ExtractError::Internal {
            message: format!("failed to parse yt-dlp metadata: {e}"),
        })
    }

    async fn download_channel(
        &self,
        url: &str,
        proxy: Option<&str>,
        output_dir: &Path,
    ) -> Result<usize, ExtractError> {
        let output = self.run(self.channel_args(url, proxy, output_dir)).await?;
        let saved = stdout_lines(&output).len();

        if saved == 0 {
            if output.status.success() {
                return Err(ExtractError::Failed {
                    message: NO_USER_VIDEOS_MESSAGE.to_string(),
                });
            }
            return Err(classify_failure(
                &String::from_utf8_lossy(&output.stderr),
                Some(output.status),
            ));
        }

        if !output.status.success() {
            tracing::warn!(
                url,
                saved,
                status = %output.status,
                "some videos of the user page could not be downloaded"
            );
        }

        Ok(saved)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
