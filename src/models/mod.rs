//! Payload types exchanged with the indexer backend.

pub mod actors;
pub mod files;
pub mod partitions;
pub mod tasks;
pub mod user;

pub use actors::{Actor, ActorState};
pub use files::{Extract, ExtractMetadata, FileDetail, FileDocument, FileMetadata, FileSummary};
pub use partitions::Partition;
pub use tasks::{
    ProgressStatus, ProgressSummary, TaskDetail, TaskDetails, TaskFilter, TaskRecord, TaskStatus,
    UploadBatch,
};
pub use user::UserInfo;
