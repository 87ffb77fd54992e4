//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] — Download requests, task status and video streaming
//! - [`system`] — Health and OpenAPI

use crate::types::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use system::*;
pub use tasks::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Form body for POST /request-download
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RequestDownloadForm {
    /// Page URL of the video to download
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body for POST /request-download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RequestDownloadResponse {
    /// Always true; failures use the error envelope instead
    pub success: bool,
    /// Identifier to poll and stream with
    pub task_id: TaskId,
}

/// Response body for GET /task-status/:task_id
///
/// `filepath` and `title` are present only for `complete` tasks, `error`
/// only for `failed` ones.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TaskStatusResponse {
    /// Current task status
    pub status: TaskStatus,
    /// Path of the downloaded artifact on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    /// Media title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `EXTRACTION_BLOCKED`, or the extractor's failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" while the server is answering
    pub status: String,
    /// Crate version
    pub version: String,
    /// Number of tasks created since startup
    pub tasks: usize,
    /// Tasks still extracting or waiting for a slot
    pub processing: usize,
}
