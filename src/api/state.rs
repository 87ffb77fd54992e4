//! Handler state

use crate::VideoDownloader;
use std::sync::Arc;

/// State shared by every route handler
///
/// Cloned per request; only the `Arc` is copied. Handlers reach configuration
/// through [`VideoDownloader::get_config`].
#[derive(Clone)]
pub struct AppState {
    /// The downloader that owns the task store and job runner
    pub downloader: Arc<VideoDownloader>,
}
