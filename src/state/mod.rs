//! Client-side state: the persisted key-value mirror and the view-model store.

mod persisted;
mod store;

pub use persisted::{DisplayMode, PersistedState};
pub use store::{AppStore, CurrentPartition, DataState, UiState, UploadOutcome};

use crate::client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted state file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Unknown partition: {0}")]
    UnknownPartition(String),
}
