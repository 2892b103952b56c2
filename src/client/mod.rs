//! Typed access to the indexer REST API.

mod error;
mod http;

pub use error::ClientError;
pub use http::RagClient;

use crate::models::{
    Actor, Extract, FileDetail, FileSummary, Partition, TaskDetail, TaskFilter, TaskRecord,
    UserInfo,
};
use async_trait::async_trait;
use std::path::Path;

/// A file ready to be sent to the indexer
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, content })
    }

    /// MIME type sniffed from the content, octet-stream when unknown.
    pub fn mime_type(&self) -> String {
        infer::get(&self.content)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
    }
}

/// Operations offered by the indexer backend
#[async_trait]
pub trait IndexerApi: Send + Sync {
    /// Replace the bearer token sent with every request
    fn set_token(&self, token: Option<String>);

    /// Check a token against `/health_check` and adopt it on success
    async fn login(&self, token: &str) -> Result<(), ClientError>;

    async fn fetch_partitions(&self) -> Result<Vec<Partition>, ClientError>;

    async fn delete_partition(&self, partition: &str) -> Result<(), ClientError>;

    async fn fetch_files(&self, partition: &str) -> Result<Vec<FileSummary>, ClientError>;

    async fn fetch_file(&self, partition: &str, file_id: &str) -> Result<FileDetail, ClientError>;

    async fn fetch_extract(&self, extract_id: &str) -> Result<Extract, ClientError>;

    async fn fetch_tasks(&self, filter: Option<TaskFilter>) -> Result<Vec<TaskRecord>, ClientError>;

    async fn fetch_task(&self, task_id: &str) -> Result<TaskDetail, ClientError>;

    /// Submit a file for indexing, returning the task status URL
    async fn add_file(
        &self,
        partition: &str,
        file_id: &str,
        upload: FileUpload,
        metadata: Option<String>,
    ) -> Result<String, ClientError>;

    async fn delete_file(&self, partition: &str, file_id: &str) -> Result<(), ClientError>;

    async fn fetch_actors(&self) -> Result<Vec<Actor>, ClientError>;

    async fn restart_actor(&self, actor_name: &str) -> Result<(), ClientError>;

    async fn fetch_user_info(&self) -> Result<UserInfo, ClientError>;
}
