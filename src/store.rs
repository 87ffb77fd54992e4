//! In-memory task store
//!
//! The store is the single piece of shared mutable state in the service. It
//! maps [`TaskId`] to the task's current [`Task`] value plus a little
//! bookkeeping. Entries live for the lifetime of the process.
//!
//! Every operation is synchronous and holds a shard lock only for the
//! duration of a single map access, so readers and writers of different
//! tasks never wait on each other and no caller ever observes a partially
//! updated task: the whole `Task` value is replaced under the lock.

use crate::error::TaskError;
use crate::types::{Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::path::PathBuf;

/// A store entry: the task plus timestamps used for diagnostics
#[derive(Debug, Clone)]
struct TaskEntry {
    task: Task,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

/// Ownership of a completed artifact, handed to the delivery path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryClaim {
    /// Path to the artifact on disk
    pub filepath: PathBuf,
    /// Media title for the delivered filename
    pub title: String,
    /// When the extraction finished
    pub finished_at: DateTime<Utc>,
}

fn deliverable(id: TaskId, entry: &TaskEntry) -> Result<DeliveryClaim, TaskError> {
    if let Some(delivered_at) = entry.delivered_at {
        return Err(TaskError::AlreadyDelivered { id, delivered_at });
    }
    match &entry.task {
        Task::Processing => Err(TaskError::NotReady { id }),
        Task::Failed { .. } => Err(TaskError::NotComplete { id }),
        Task::Complete { filepath, title } => Ok(DeliveryClaim {
            filepath: filepath.clone(),
            title: title.clone(),
            finished_at: entry.finished_at.unwrap_or(entry.created_at),
        }),
    }
}

/// Concurrent in-memory map from task id to task state
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<TaskId, TaskEntry>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh identifier and insert a `processing` task for it
    pub fn create(&self) -> TaskId {
        loop {
            let id = TaskId::new();
            if let Entry::Vacant(slot) = self.tasks.entry(id) {
                slot.insert(TaskEntry {
                    task: Task::Processing,
                    created_at: Utc::now(),
                    finished_at: None,
                    delivered_at: None,
                });
                return id;
            }
        }
    }

    /// Snapshot of the task's current state
    pub fn get(&self, id: TaskId) -> Result<Task, TaskError> {
        self.tasks
            .get(&id)
            .map(|entry| entry.task.clone())
            .ok_or(TaskError::NotFound { id })
    }

    /// When the task was created
    pub fn created_at(&self, id: TaskId) -> Result<DateTime<Utc>, TaskError> {
        self.tasks
            .get(&id)
            .map(|entry| entry.created_at)
            .ok_or(TaskError::NotFound { id })
    }

    /// Record a successful extraction
    pub fn set_complete(
        &self,
        id: TaskId,
        filepath: PathBuf,
        title: String,
    ) -> Result<(), TaskError> {
        self.finish(id, Task::Complete { filepath, title })
    }

    /// Record a failed extraction
    pub fn set_failed(&self, id: TaskId, error: String) -> Result<(), TaskError> {
        self.finish(id, Task::Failed { error })
    }

    fn finish(&self, id: TaskId, terminal: Task) -> Result<(), TaskError> {
        let mut entry = self.tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        if entry.task.is_terminal() {
            return Err(TaskError::AlreadyTerminal {
                id,
                status: entry.task.status().to_string(),
            });
        }
        entry.task = terminal;
        entry.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Check that a task's artifact could be claimed, without claiming it.
    ///
    /// Fails with the same errors as [`claim_delivery`](Self::claim_delivery).
    /// The delivery path opens the file between the two calls, so a file that
    /// cannot be opened never uses up the single delivery.
    pub fn peek_delivery(&self, id: TaskId) -> Result<DeliveryClaim, TaskError> {
        let entry = self.tasks.get(&id).ok_or(TaskError::NotFound { id })?;
        deliverable(id, &entry)
    }

    /// Take ownership of a completed task's artifact for streaming.
    ///
    /// Succeeds at most once per task. The status stays `complete`; only the
    /// delivery timestamp is recorded.
    pub fn claim_delivery(&self, id: TaskId) -> Result<DeliveryClaim, TaskError> {
        let mut entry = self.tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        let claim = deliverable(id, &entry)?;
        entry.delivered_at = Some(Utc::now());
        Ok(claim)
    }

    /// Number of tasks currently in the given status
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks
            .iter()
            .filter(|entry| entry.task.status() == status)
            .count()
    }

    /// Total number of tasks ever created in this process
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task was created yet
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
