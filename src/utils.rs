//! Utility functions for file naming and directory handling

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Characters a delivered filename may keep; everything else becomes `_`
#[allow(clippy::expect_used)]
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_.\-]").expect("filename regex"));

/// Replace every character outside `[a-zA-Z0-9_.-]` with `_`
///
/// The replacement is per character, so the result has exactly as many
/// characters as the input.
///
/// # Examples
///
/// ```
/// use shortvid_dl::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("Weird/Title:Test*"), "Weird_Title_Test_");
/// assert_eq!(sanitize_title("ça va"), "_a_va");
/// ```
pub fn sanitize_title(title: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(title, "_").into_owned()
}

/// Filename presented to the client for a delivered video
pub fn delivered_filename(title: &str) -> String {
    format!("{}.mp4", sanitize_title(title))
}

/// Create `dir` (and parents) if it does not exist yet
pub async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}
