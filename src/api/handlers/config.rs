use crate::AppState;
use crate::api::error::AppError;
use axum::{Json, extract::State};
use serde_json::Value;

/// Serves `config.json` to the front-end, re-read on every request.
#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Runtime front-end configuration"),
        (status = 404, description = "Configuration file missing")
    ),
    tag = "config"
)]
pub async fn get_config(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let raw = match tokio::fs::read_to_string(state.config_path.as_ref()).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Config file {} not found", state.config_path.display());
            return Err(AppError::NotFound("Configuration file not found".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let config: Value = serde_json::from_str(&raw)?;
    Ok(Json(config))
}
