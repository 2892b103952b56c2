//! File and extract payloads.

use serde::{Deserialize, Serialize};

/// A file as listed in a partition (from `GET /partition/{partition}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_id: String,
    pub filename: String,
    pub link: String,
    pub partition: String,
    pub source: String,
    pub created_at: String,
    pub file_size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_id: String,
    pub filename: String,
    pub partition: String,
    pub source: String,
    pub page: u32,
    pub file_size: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDocument {
    pub link: String,
}

/// A single file with its extract links (from `GET /partition/{partition}/file/{file_id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetail {
    pub metadata: FileMetadata,
    #[serde(default)]
    pub documents: Vec<FileDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractMetadata {
    #[serde(rename = "_id")]
    pub id: String,
    pub partition: String,
    pub file_id: String,
    pub filename: String,
    pub page: u32,
    pub page_sep: String,
    pub source: String,
}

/// A chunk of indexed content (from `GET /extract/{extract_id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extract {
    pub metadata: ExtractMetadata,
    pub page_content: String,
}

impl FileDetail {
    /// Extract ids are the last path segment of each document link.
    pub fn extract_ids(&self) -> Vec<&str> {
        self.documents
            .iter()
            .filter_map(|d| d.link.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilesEnvelope {
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddFileResponse {
    pub task_status_url: String,
}
