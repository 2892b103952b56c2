//! Indexing task payloads and upload bookkeeping types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// State of a task in the indexing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    Serializing,
    Chunking,
    Inserting,
    Completed,
    Failed,
}

impl TaskStatus {
    /// No transition follows a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "QUEUED",
            TaskStatus::Serializing => "SERIALIZING",
            TaskStatus::Chunking => "CHUNKING",
            TaskStatus::Inserting => "INSERTING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter accepted by `GET /queue/tasks?status=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    Status(TaskStatus),
    /// Every task that is not in a terminal state
    Active,
}

impl TaskFilter {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            TaskFilter::Status(status) => status.as_str(),
            TaskFilter::Active => "ACTIVE",
        }
    }
}

impl std::str::FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => TaskFilter::Active,
            "QUEUED" => TaskFilter::Status(TaskStatus::Queued),
            "SERIALIZING" => TaskFilter::Status(TaskStatus::Serializing),
            "CHUNKING" => TaskFilter::Status(TaskStatus::Chunking),
            "INSERTING" => TaskFilter::Status(TaskStatus::Inserting),
            "COMPLETED" => TaskFilter::Status(TaskStatus::Completed),
            "FAILED" => TaskFilter::Status(TaskStatus::Failed),
            other => return Err(format!("unknown task status: {}", other)),
        };
        Ok(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetails {
    pub file_id: String,
    pub partition: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A task as listed by `GET /queue/tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub state: TaskStatus,
    pub details: TaskDetails,
    #[serde(default)]
    pub url: String,
}

impl TaskRecord {
    pub fn file_id(&self) -> &str {
        &self.details.file_id
    }

    pub fn partition(&self) -> &str {
        &self.details.partition
    }
}

/// A single task (from `GET /indexer/task/{task_id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    pub task_id: String,
    pub task_state: TaskStatus,
    pub details: TaskDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TasksEnvelope {
    pub tasks: Vec<TaskRecord>,
}

/// Files submitted together in one user action.
///
/// There is no server-side counterpart: the batch only exists so the client
/// can aggregate the progress of its tasks. Decoding goes through
/// [`UploadBatch::new`], so stored batches never carry repeated ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredUploadBatch")]
pub struct UploadBatch {
    pub partition: String,
    pub file_ids: Vec<String>,
}

impl UploadBatch {
    /// Duplicate ids are dropped, keeping first-seen order.
    pub fn new<I, S>(partition: impl Into<String>, file_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let file_ids = file_ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| seen.insert(id.clone()))
            .collect();

        Self {
            partition: partition.into(),
            file_ids,
        }
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.file_ids.iter().any(|id| id == file_id)
    }
}

#[derive(Deserialize)]
struct StoredUploadBatch {
    partition: String,
    #[serde(default)]
    file_ids: Vec<String>,
}

impl From<StoredUploadBatch> for UploadBatch {
    fn from(stored: StoredUploadBatch) -> Self {
        UploadBatch::new(stored.partition, stored.file_ids)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    InProgress,
    Success,
    Failed,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressStatus::InProgress => "IN_PROGRESS",
            ProgressStatus::Success => "SUCCESS",
            ProgressStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Aggregate state of an [`UploadBatch`], derived from the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub status: ProgressStatus,
    /// Percentage of files in a terminal state, 0 to 100
    pub progress: u8,
    pub completed_files: usize,
    pub failed_files: usize,
}

impl ProgressSummary {
    pub fn is_finished(&self) -> bool {
        self.status != ProgressStatus::InProgress
    }
}
