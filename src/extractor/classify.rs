//! Classification of `yt-dlp` failures

use crate::error::ExtractError;
use std::process::ExitStatus;

/// Lowercased stderr fragments that mean the site refused us or never answered
const BLOCKED_MARKERS: &[&str] = &["your ip address is blocked", "timed out"];

/// Map a failed `yt-dlp` run to an [`ExtractError`]
///
/// Access blocks and timeouts become [`ExtractError::Blocked`] so callers can
/// suggest a proxy. Anything else is passed through as
/// [`ExtractError::Failed`] with the tool's own message.
pub fn classify_failure(stderr: &str, status: Option<ExitStatus>) -> ExtractError {
    let message = stderr.trim();
    let lower = message.to_lowercase();

    if BLOCKED_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return ExtractError::Blocked {
            message: message.to_string(),
        };
    }

    if message.is_empty() {
        let status = status.map_or_else(|| "unknown status".to_string(), |s| s.to_string());
        return ExtractError::Failed {
            message: format!("yt-dlp exited with {status}"),
        };
    }

    ExtractError::Failed {
        message: message.to_string(),
    }
}
