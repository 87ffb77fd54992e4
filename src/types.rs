//! Core types for shortvid-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a download task
///
/// Random (UUID v4) so identifiers are never reused within a process and
/// cannot be guessed from one another. Also used as the on-disk file stem of
/// the task's artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Allocate a fresh random identifier
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// State of a download task
///
/// Serialized as the JSON mirror returned by the status endpoint:
///
/// ```json
/// {"status":"processing"}
/// {"status":"complete","filepath":"downloads/<id>.mp4","title":"My clip"}
/// {"status":"failed","error":"EXTRACTION_BLOCKED"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Task {
    /// Extraction has not finished yet
    Processing,
    /// The artifact is on disk and ready to stream
    Complete {
        /// Path to the downloaded artifact
        filepath: PathBuf,
        /// Media title, used to name the delivered file
        title: String,
    },
    /// Extraction failed; no artifact exists
    Failed {
        /// Classified error code or extractor message
        error: String,
    },
}

impl Task {
    /// Status discriminant of this task
    pub fn status(&self) -> TaskStatus {
        match self {
            Task::Processing => TaskStatus::Processing,
            Task::Complete { .. } => TaskStatus::Complete,
            Task::Failed { .. } => TaskStatus::Failed,
        }
    }

    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Task status without payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Extraction in progress (initial state)
    Processing,
    /// Terminal: artifact available
    Complete,
    /// Terminal: extraction failed
    Failed,
}

impl TaskStatus {
    /// Whether this is `Complete` or `Failed`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Processing)
    }

    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Complete => "complete",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable error codes shared by the task store, the job runner and the API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown task id, or the artifact is not available
    NotFound,
    /// Stream requested while the task is still processing
    NotReady,
    /// The site blocked the request or it timed out
    ExtractionBlocked,
    /// Any other extractor failure
    ExtractionFailed,
    /// Unexpected failure during background processing
    Internal,
}

impl ErrorCode {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::NotReady => "NOT_READY",
            ErrorCode::ExtractionBlocked => "EXTRACTION_BLOCKED",
            ErrorCode::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
