use super::{DisplayMode, PersistedState, StoreError};
use crate::client::{ClientError, FileUpload, IndexerApi};
use crate::models::{FileDetail, FileSummary, Partition, ProgressSummary, TaskRecord, UploadBatch};
use crate::services::progress::compute_progress;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub show_upload_modal: bool,
    pub show_login_page: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_upload_modal: false,
            show_login_page: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentPartition {
    pub partition: Option<Partition>,
    pub files: Vec<FileSummary>,
}

/// In-memory mirror of server lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataState {
    pub partitions: Vec<Partition>,
    pub current_partition: CurrentPartition,
    pub current_file: Option<FileDetail>,
    /// Last task list fetched from the queue
    pub tasks: Vec<TaskRecord>,
}

/// Result of submitting several files at once
#[derive(Debug)]
pub struct UploadOutcome {
    /// Files the backend accepted
    pub batch: UploadBatch,
    pub failures: Vec<(String, ClientError)>,
}

/// View-model store shared by every screen.
///
/// Fetches happen before any lock is taken, so readers never wait on the network.
pub struct AppStore {
    api: Arc<dyn IndexerApi>,
    persisted: Mutex<PersistedState>,
    ui: RwLock<UiState>,
    data: RwLock<DataState>,
}

impl AppStore {
    pub fn new(api: Arc<dyn IndexerApi>, persisted: PersistedState) -> Self {
        Self {
            api,
            persisted: Mutex::new(persisted),
            ui: RwLock::new(UiState::default()),
            data: RwLock::new(DataState::default()),
        }
    }

    pub fn api(&self) -> &Arc<dyn IndexerApi> {
        &self.api
    }

    pub async fn ui(&self) -> UiState {
        self.ui.read().await.clone()
    }

    pub async fn data(&self) -> DataState {
        self.data.read().await.clone()
    }

    pub async fn tasks(&self) -> Vec<TaskRecord> {
        self.data.read().await.tasks.clone()
    }

    pub async fn set_show_upload_modal(&self, show: bool) {
        self.ui.write().await.show_upload_modal = show;
    }

    pub async fn display_mode(&self) -> DisplayMode {
        self.persisted.lock().await.display_mode()
    }

    pub async fn set_display_mode(&self, mode: DisplayMode) -> Result<(), StoreError> {
        self.persisted.lock().await.set_display_mode(mode).await?;
        Ok(())
    }

    pub async fn navbar_collapsed(&self) -> bool {
        self.persisted.lock().await.navbar_collapsed()
    }

    pub async fn set_navbar_collapsed(&self, collapsed: bool) -> Result<(), StoreError> {
        self.persisted.lock().await.set_navbar_collapsed(collapsed).await?;
        Ok(())
    }

    /// Surface a rejected token by sending the user back to the login page.
    async fn check<T>(&self, result: Result<T, ClientError>) -> Result<T, StoreError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                warn!("Backend rejected the auth token: {}", e);
                self.ui.write().await.show_login_page = true;
            }
        }
        Ok(result?)
    }

    /// Reuse a stored, unexpired token without contacting the backend.
    pub async fn restore_session(&self) -> Result<bool, StoreError> {
        let token = self.persisted.lock().await.auth_token().await?;
        let logged_in = token.is_some();
        self.api.set_token(token);
        self.ui.write().await.show_login_page = !logged_in;
        Ok(logged_in)
    }

    pub async fn login(&self, token: String) -> Result<(), StoreError> {
        self.api.login(&token).await?;
        self.persisted.lock().await.set_auth_token(token).await?;
        self.ui.write().await.show_login_page = false;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), StoreError> {
        self.api.set_token(None);
        self.persisted.lock().await.clear_auth_token().await?;
        *self.data.write().await = DataState::default();
        self.ui.write().await.show_login_page = true;
        info!("👋 Logged out");
        Ok(())
    }

    /// Refresh partitions and tasks together.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let fetched = futures::future::try_join(
            self.api.fetch_partitions(),
            self.api.fetch_tasks(None),
        )
        .await;
        let (partitions, tasks) = self.check(fetched).await?;

        let mut data = self.data.write().await;
        data.partitions = partitions;
        data.tasks = tasks;
        Ok(())
    }

    pub async fn refresh_partitions(&self) -> Result<Vec<Partition>, StoreError> {
        let partitions = self.check(self.api.fetch_partitions().await).await?;
        self.data.write().await.partitions = partitions.clone();
        Ok(partitions)
    }

    pub async fn refresh_tasks(&self) -> Result<(), StoreError> {
        let tasks = self.check(self.api.fetch_tasks(None).await).await?;
        self.data.write().await.tasks = tasks;
        Ok(())
    }

    /// Make `name` the current partition and load its files.
    pub async fn select_partition(&self, name: &str) -> Result<Vec<FileSummary>, StoreError> {
        let known = self
            .data
            .read()
            .await
            .partitions
            .iter()
            .find(|p| p.partition == name)
            .cloned();
        let partition = match known {
            Some(p) => p,
            None => self
                .refresh_partitions()
                .await?
                .into_iter()
                .find(|p| p.partition == name)
                .ok_or_else(|| StoreError::UnknownPartition(name.to_string()))?,
        };

        let files = self.check(self.api.fetch_files(name).await).await?;

        let mut data = self.data.write().await;
        data.current_partition = CurrentPartition {
            partition: Some(partition),
            files: files.clone(),
        };
        data.current_file = None;
        Ok(files)
    }

    pub async fn select_file(&self, partition: &str, file_id: &str) -> Result<FileDetail, StoreError> {
        let file = self.check(self.api.fetch_file(partition, file_id).await).await?;
        self.data.write().await.current_file = Some(file.clone());
        Ok(file)
    }

    pub async fn delete_partition(&self, name: &str) -> Result<(), StoreError> {
        self.check(self.api.delete_partition(name).await).await?;

        let mut data = self.data.write().await;
        data.partitions.retain(|p| p.partition != name);
        let is_current = data
            .current_partition
            .partition
            .as_ref()
            .is_some_and(|p| p.partition == name);
        if is_current {
            data.current_partition = CurrentPartition::default();
            data.current_file = None;
        }
        Ok(())
    }

    pub async fn delete_file(&self, partition: &str, file_id: &str) -> Result<(), StoreError> {
        self.check(self.api.delete_file(partition, file_id).await).await?;

        let mut data = self.data.write().await;
        data.current_partition
            .files
            .retain(|f| !(f.partition == partition && f.file_id == file_id));
        if data
            .current_file
            .as_ref()
            .is_some_and(|f| f.metadata.file_id == file_id && f.metadata.partition == partition)
        {
            data.current_file = None;
        }
        Ok(())
    }

    /// Submit files one by one and remember the accepted ones as an active upload.
    pub async fn submit_upload(
        &self,
        partition: &str,
        files: Vec<(String, FileUpload)>,
        metadata: Option<String>,
    ) -> Result<UploadOutcome, StoreError> {
        let mut accepted = Vec::with_capacity(files.len());
        let mut failures = Vec::new();

        for (file_id, upload) in files {
            match self
                .api
                .add_file(partition, &file_id, upload, metadata.clone())
                .await
            {
                Ok(_) => accepted.push(file_id),
                Err(e) if e.is_unauthorized() => {
                    self.ui.write().await.show_login_page = true;
                    failures.push((file_id, e));
                }
                Err(e) => {
                    warn!("Failed to submit {}: {}", file_id, e);
                    failures.push((file_id, e));
                }
            }
        }

        let batch = UploadBatch::new(partition, accepted);
        if !batch.file_ids.is_empty() {
            self.persisted
                .lock()
                .await
                .push_active_upload(batch.clone())
                .await?;
            info!(
                "📦 Tracking upload of {} file(s) into \"{}\"",
                batch.file_ids.len(),
                partition
            );
        }
        self.ui.write().await.show_upload_modal = false;

        Ok(UploadOutcome { batch, failures })
    }

    pub async fn upload_progress(&self, batch: &UploadBatch) -> ProgressSummary {
        let data = self.data.read().await;
        compute_progress(batch, &data.tasks)
    }

    pub async fn active_upload_progress(&self) -> Vec<(UploadBatch, ProgressSummary)> {
        let uploads = self.persisted.lock().await.active_uploads().to_vec();
        let data = self.data.read().await;
        uploads
            .into_iter()
            .map(|batch| {
                let summary = compute_progress(&batch, &data.tasks);
                (batch, summary)
            })
            .collect()
    }

    /// Forget uploads whose files all reached a terminal state.
    pub async fn prune_finished_uploads(
        &self,
    ) -> Result<Vec<(UploadBatch, ProgressSummary)>, StoreError> {
        let tasks = self.tasks().await;
        let mut finished = Vec::new();

        self.persisted
            .lock()
            .await
            .retain_active_uploads(|batch| {
                let summary = compute_progress(batch, &tasks);
                if summary.is_finished() {
                    finished.push((batch.clone(), summary));
                    false
                } else {
                    true
                }
            })
            .await?;

        Ok(finished)
    }
}
