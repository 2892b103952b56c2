use super::StateError;
use crate::models::UploadBatch;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How file listings are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Grid,
    #[default]
    List,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedData {
    #[serde(rename = "AUTH_TOKEN", default)]
    auth_token: Option<String>,
    /// Unix milliseconds
    #[serde(rename = "authTokenCreatedAt", default)]
    auth_token_created_at: Option<i64>,
    #[serde(rename = "navbarCollapsed", default)]
    navbar_collapsed: bool,
    #[serde(rename = "displayMode", default)]
    display_mode: DisplayMode,
    #[serde(rename = "activeUploads", default)]
    active_uploads: Vec<UploadBatch>,
}

/// Flat key-value state that survives restarts.
///
/// Every setter writes the whole object back to disk.
#[derive(Debug)]
pub struct PersistedState {
    path: PathBuf,
    token_ttl: Duration,
    data: PersistedData,
}

impl PersistedState {
    /// Load state from `path`, starting empty when the file does not exist.
    ///
    /// Runs once at startup, before any task shares the state, so it reads
    /// synchronously. Writes go through `tokio::fs`.
    pub fn load(path: impl Into<PathBuf>, token_ttl: Duration) -> Result<Self, StateError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => PersistedData::default(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersistedData::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Loaded persisted state from {}", path.display());
        Ok(Self {
            path,
            token_ttl,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&self.data)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// The stored token, unless it is older than the configured TTL.
    pub async fn auth_token(&mut self) -> Result<Option<String>, StateError> {
        self.auth_token_at(Utc::now()).await
    }

    pub async fn auth_token_at(&mut self, now: DateTime<Utc>) -> Result<Option<String>, StateError> {
        if self.data.auth_token.is_none() {
            return Ok(None);
        }

        let expired = match self
            .data
            .auth_token_created_at
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            Some(created_at) => now - created_at >= self.token_ttl,
            // A token without a creation time cannot be aged
            None => true,
        };

        if expired {
            tracing::info!("⏰ Stored auth token expired, discarding it");
            self.clear_auth_token().await?;
            return Ok(None);
        }

        Ok(self.data.auth_token.clone())
    }

    pub async fn set_auth_token(&mut self, token: String) -> Result<(), StateError> {
        self.set_auth_token_at(token, Utc::now()).await
    }

    pub async fn set_auth_token_at(&mut self, token: String, now: DateTime<Utc>) -> Result<(), StateError> {
        self.data.auth_token = Some(token);
        self.data.auth_token_created_at = Some(now.timestamp_millis());
        self.save().await
    }

    pub async fn clear_auth_token(&mut self) -> Result<(), StateError> {
        self.data.auth_token = None;
        self.data.auth_token_created_at = None;
        self.save().await
    }

    pub fn navbar_collapsed(&self) -> bool {
        self.data.navbar_collapsed
    }

    pub async fn set_navbar_collapsed(&mut self, collapsed: bool) -> Result<(), StateError> {
        self.data.navbar_collapsed = collapsed;
        self.save().await
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.data.display_mode
    }

    pub async fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), StateError> {
        self.data.display_mode = mode;
        self.save().await
    }

    pub fn active_uploads(&self) -> &[UploadBatch] {
        &self.data.active_uploads
    }

    pub async fn push_active_upload(&mut self, batch: UploadBatch) -> Result<(), StateError> {
        self.data.active_uploads.push(batch);
        self.save().await
    }

    /// Keep only the uploads matching `keep`, returning how many were dropped.
    pub async fn retain_active_uploads<F>(&mut self, keep: F) -> Result<usize, StateError>
    where
        F: FnMut(&UploadBatch) -> bool,
    {
        let before = self.data.active_uploads.len();
        self.data.active_uploads.retain(keep);
        let removed = before - self.data.active_uploads.len();
        if removed > 0 {
            self.save().await?;
        }
        Ok(removed)
    }
}
