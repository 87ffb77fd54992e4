//! Error types for shortvid-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (task lifecycle, extraction)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::{ErrorCode, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for shortvid-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shortvid-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "extractor.proxy")
        key: Option<String>,
    },

    /// Task lifecycle error (unknown id, wrong state)
    #[error("{0}")]
    Task(#[from] TaskError),

    /// Extraction failed
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Invalid client input
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// External tool could not be located or executed (yt-dlp)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the task store and the delivery path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Task id was never issued by this process
    #[error("task {id} not found")]
    NotFound {
        /// The unknown task id
        id: TaskId,
    },

    /// Task is still processing
    #[error("task {id} is still processing")]
    NotReady {
        /// The task that is not ready
        id: TaskId,
    },

    /// Task ended in the failed state and has nothing to deliver
    #[error("video not ready or task {id} failed")]
    NotComplete {
        /// The failed task
        id: TaskId,
    },

    /// A terminal task received a second terminal write
    #[error("task {id} is already {status}")]
    AlreadyTerminal {
        /// The task id
        id: TaskId,
        /// Current terminal status ("complete" or "failed")
        status: String,
    },

    /// The artifact was already streamed once and removed
    #[error("video for task {id} was already delivered at {delivered_at}")]
    AlreadyDelivered {
        /// The task id
        id: TaskId,
        /// When the artifact was claimed for delivery
        delivered_at: DateTime<Utc>,
    },

    /// The artifact is not on disk any more
    #[error("downloaded file not found on server: {path}")]
    FileMissing {
        /// The task id
        id: TaskId,
        /// Where the artifact was expected
        path: PathBuf,
    },
}

/// Classified extractor failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The source site blocked the request or it timed out; a proxy may help
    #[error("access blocked or timed out: {message}")]
    Blocked {
        /// Raw extractor message
        message: String,
    },

    /// Any other extractor-reported failure (unsupported URL, removed content, ...)
    #[error("{message}")]
    Failed {
        /// Extractor message, passed through to clients
        message: String,
    },

    /// Unexpected failure around the extractor (spawn failure, bad output)
    #[error("{message}")]
    Internal {
        /// Description of what went wrong
        message: String,
    },
}

impl ExtractError {
    /// The value recorded in a failed task's `error` field.
    ///
    /// Blocked extractions are reported by code so clients can suggest a proxy;
    /// other failures pass their message through.
    pub fn task_error(&self) -> String {
        match self {
            ExtractError::Blocked { .. } => ErrorCode::ExtractionBlocked.to_string(),
            ExtractError::Failed { message } => message.clone(),
            ExtractError::Internal { message } => {
                format!("An unexpected error occurred: {message}")
            }
        }
    }

    /// Taxonomy code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractError::Blocked { .. } => ErrorCode::ExtractionBlocked,
            ExtractError::Failed { .. } => ErrorCode::ExtractionFailed,
            ExtractError::Internal { .. } => ErrorCode::Internal,
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "NOT_FOUND",
///     "message": "task 6f1c... not found",
///     "details": {
///       "task_id": "6f1c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            // Every delivery precondition failure is a 404 to the client
            Error::Task(TaskError::NotFound { .. }) => 404,
            Error::Task(TaskError::NotReady { .. }) => 404,
            Error::Task(TaskError::NotComplete { .. }) => 404,
            Error::Task(TaskError::AlreadyDelivered { .. }) => 404,
            Error::Task(TaskError::FileMissing { .. }) => 404,

            // 409 Conflict - caller tried to rewrite a terminal task
            Error::Task(TaskError::AlreadyTerminal { .. }) => 409,

            // 502 Bad Gateway - the upstream site refused or failed
            Error::Extract(ExtractError::Blocked { .. }) => 502,
            Error::Extract(ExtractError::Failed { .. }) => 502,
            Error::Extract(ExtractError::Internal { .. }) => 500,

            // 503 Service Unavailable
            Error::ExternalTool(_) => 503,
            Error::ShuttingDown => 503,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Task(e) => match e {
                TaskError::NotReady { .. } => ErrorCode::NotReady.as_str(),
                TaskError::AlreadyTerminal { .. } => "already_terminal",
                TaskError::NotFound { .. }
                | TaskError::NotComplete { .. }
                | TaskError::AlreadyDelivered { .. }
                | TaskError::FileMissing { .. } => ErrorCode::NotFound.as_str(),
            },
            Error::Extract(e) => e.code().as_str(),
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Task(TaskError::NotFound { id })
            | Error::Task(TaskError::NotReady { id })
            | Error::Task(TaskError::NotComplete { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::AlreadyTerminal { id, status }) => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::Task(TaskError::AlreadyDelivered { id, delivered_at }) => {
                Some(serde_json::json!({
                    "task_id": id,
                    "delivered_at": delivered_at,
                }))
            }
            Error::Task(TaskError::FileMissing { id, path }) => Some(serde_json::json!({
                "task_id": id,
                "path": path,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
