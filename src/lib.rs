pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::{Json, Router, routing::get};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::config::get_config,
        api::handlers::health::health_check,
    ),
    components(schemas(api::handlers::health::HealthResponse)),
    tags(
        (name = "config", description = "Front-end runtime configuration"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    /// config.json handed to the browser front-end
    pub config_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Arc::new(config_path.into()),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/config", get(api::handlers::config::get_config))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state)
}
