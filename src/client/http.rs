use super::{ClientError, FileUpload, IndexerApi};
use crate::config::ClientConfig;
use crate::models::actors::ActorsEnvelope;
use crate::models::files::{AddFileResponse, FilesEnvelope};
use crate::models::partitions::PartitionsEnvelope;
use crate::models::tasks::TasksEnvelope;
use crate::models::{
    Actor, Extract, FileDetail, FileSummary, Partition, TaskDetail, TaskFilter, TaskRecord,
    UserInfo,
};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

/// Characters escaped inside a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// `IndexerApi` over HTTP with a bearer token
pub struct RagClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl RagClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(config.include_credentials)
            .build()?;

        info!(
            "🔌 Indexer client ready: base_url={}, credentials={}",
            config.api_base_url, config.include_credentials
        );

        Ok(Self {
            http,
            base_url: crate::config::normalize_url(&config.api_base_url),
            token: RwLock::new(None),
        })
    }

    pub fn with_token(self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, ClientError> {
        let builder = self.http.request(method, url);
        match self.current_token() {
            Some(token) => Ok(builder.header(AUTHORIZATION, bearer(&token)?)),
            None => Ok(builder),
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Failed to {}: {}", operation, status);
            return Err(ClientError::Status { operation, status });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
    ) -> Result<T, ClientError> {
        let builder = self.request(Method::GET, &self.url(path))?;
        let response = self.send(builder, operation).await?;
        Ok(response.json::<T>().await?)
    }
}

fn bearer(token: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl IndexerApi for RagClient {
    fn set_token(&self, token: Option<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    async fn login(&self, token: &str) -> Result<(), ClientError> {
        info!("Trying to log in...");
        let builder = self
            .http
            .get(self.url("/health_check"))
            .header(AUTHORIZATION, bearer(token)?);
        self.send(builder, "log in").await?;

        self.set_token(Some(token.to_string()));
        info!("✅ Log in successful.");
        Ok(())
    }

    async fn fetch_partitions(&self) -> Result<Vec<Partition>, ClientError> {
        debug!("Fetching partitions...");
        let envelope: PartitionsEnvelope = self.get_json("/partition/", "fetch partitions").await?;
        debug!("Fetched {} partitions", envelope.partitions.len());
        Ok(envelope.partitions)
    }

    async fn delete_partition(&self, partition: &str) -> Result<(), ClientError> {
        info!("Deleting partition \"{}\"...", partition);
        let url = self.url(&format!("/partition/{}", segment(partition)));
        let builder = self.request(Method::DELETE, &url)?;
        self.send(builder, "delete partition").await?;
        info!("🗑️  Partition \"{}\" deleted.", partition);
        Ok(())
    }

    async fn fetch_files(&self, partition: &str) -> Result<Vec<FileSummary>, ClientError> {
        debug!("Fetching files from partition \"{}\"...", partition);
        let path = format!("/partition/{}", segment(partition));
        let envelope: FilesEnvelope = self.get_json(&path, "fetch files").await?;
        Ok(envelope.files)
    }

    async fn fetch_file(&self, partition: &str, file_id: &str) -> Result<FileDetail, ClientError> {
        debug!("Fetching file \"{}\" from partition \"{}\"...", file_id, partition);
        let path = format!("/partition/{}/file/{}", segment(partition), segment(file_id));
        self.get_json(&path, "fetch file").await
    }

    async fn fetch_extract(&self, extract_id: &str) -> Result<Extract, ClientError> {
        debug!("Fetching extract \"{}\"...", extract_id);
        let path = format!("/extract/{}", segment(extract_id));
        self.get_json(&path, "fetch extract").await
    }

    async fn fetch_tasks(&self, filter: Option<TaskFilter>) -> Result<Vec<TaskRecord>, ClientError> {
        let mut builder = self.request(Method::GET, &self.url("/queue/tasks"))?;
        if let Some(filter) = filter {
            debug!("Fetching tasks with {} status...", filter.as_query_value());
            builder = builder.query(&[("status", filter.as_query_value())]);
        } else {
            debug!("Fetching tasks...");
        }

        let response = self.send(builder, "fetch tasks").await?;
        let envelope: TasksEnvelope = response.json().await?;
        debug!("Fetched {} tasks", envelope.tasks.len());
        Ok(envelope.tasks)
    }

    async fn fetch_task(&self, task_id: &str) -> Result<TaskDetail, ClientError> {
        debug!("Fetching task {}...", task_id);
        let path = format!("/indexer/task/{}", segment(task_id));
        self.get_json(&path, "fetch task").await
    }

    async fn add_file(
        &self,
        partition: &str,
        file_id: &str,
        upload: FileUpload,
        metadata: Option<String>,
    ) -> Result<String, ClientError> {
        info!(
            "📤 Indexing file \"{}\" into partition \"{}\" as {}...",
            upload.file_name, partition, file_id
        );

        let mime_type = upload.mime_type();
        let part = Part::bytes(upload.content)
            .file_name(upload.file_name)
            .mime_str(&mime_type)?;
        let mut form = Form::new().part("file", part);
        if let Some(metadata) = metadata {
            form = form.text("metadata", metadata);
        }

        let url = self.url(&format!(
            "/indexer/partition/{}/file/{}",
            segment(partition),
            segment(file_id)
        ));
        let builder = self.request(Method::POST, &url)?.multipart(form);
        let response = self.send(builder, "index file").await?;
        let body: AddFileResponse = response.json().await?;

        info!("Indexing started for {}.", file_id);
        Ok(body.task_status_url)
    }

    async fn delete_file(&self, partition: &str, file_id: &str) -> Result<(), ClientError> {
        info!("Deleting file \"{}\" from partition \"{}\"...", file_id, partition);
        let url = self.url(&format!(
            "/indexer/partition/{}/file/{}",
            segment(partition),
            segment(file_id)
        ));
        let builder = self.request(Method::DELETE, &url)?;
        self.send(builder, "delete file").await?;
        info!("🗑️  File \"{}\" deleted.", file_id);
        Ok(())
    }

    async fn fetch_actors(&self) -> Result<Vec<Actor>, ClientError> {
        debug!("Fetching actors...");
        let envelope: ActorsEnvelope = self.get_json("/actors/", "fetch actors").await?;
        Ok(envelope.actors)
    }

    async fn restart_actor(&self, actor_name: &str) -> Result<(), ClientError> {
        info!("Restarting actor {}...", actor_name);
        let url = self.url(&format!("/actors/{}/restart", segment(actor_name)));
        let builder = self.request(Method::POST, &url)?;
        self.send(builder, "restart actor").await?;
        info!("🔄 Actor {} restarted.", actor_name);
        Ok(())
    }

    async fn fetch_user_info(&self) -> Result<UserInfo, ClientError> {
        debug!("Fetching user info...");
        self.get_json("/user/info", "fetch user info").await
    }
}
