use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Runtime configuration of the indexer client
#[derive(Debug, Clone, Validate)]
pub struct ClientConfig {
    /// Base URL of the indexer API, without trailing slash
    #[validate(url(message = "API_BASE_URL must be an absolute URL"))]
    pub api_base_url: String,

    /// Keep cookies set by the backend across requests (default: false)
    pub include_credentials: bool,

    /// Request timeout in seconds (default: 30)
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// Interval between task list refreshes in seconds (default: 2)
    #[validate(range(min = 1))]
    pub poll_interval_secs: u64,

    /// Location of the persisted client state (default: ".indexer-ui/state.json")
    pub state_path: PathBuf,

    /// Hours after which a stored auth token is discarded (default: 24)
    pub auth_token_ttl_hours: i64,

    /// config.json served by `GET /api/config` (default: "config.json")
    pub config_path: PathBuf,
}

/// Shape of `config.json`, shared with the browser front-end
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "API_BASE_URL")]
    api_base_url: String,
    #[serde(rename = "INCLUDE_CREDENTIALS", default)]
    include_credentials: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            include_credentials: false,
            request_timeout_secs: 30,
            poll_interval_secs: 2,
            state_path: PathBuf::from(".indexer-ui/state.json"),
            auth_token_ttl_hours: 24,
            config_path: PathBuf::from("config.json"),
        }
    }
}

/// Removes the trailing slash from a base URL if present.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_flag(v: &str) -> bool {
    let v = v.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes"
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| normalize_url(&v))
                .unwrap_or(default.api_base_url),

            include_credentials: env::var("INCLUDE_CREDENTIALS")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.include_credentials),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_secs),

            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.poll_interval_secs),

            state_path: env::var("STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.state_path),

            auth_token_ttl_hours: env::var("AUTH_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.auth_token_ttl_hours),

            config_path: env::var("CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.config_path),
        }
    }

    /// Overlay the API settings found in a `config.json` file.
    pub fn with_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        self.api_base_url = normalize_url(&file.api_base_url);
        self.include_credentials = file.include_credentials;
        Ok(self)
    }

    /// Environment first, then `config_path` when that file exists.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::from_env();
        if let Some(path) = config_path {
            config.config_path = path;
        }
        let config = if config.config_path.exists() {
            let path = config.config_path.clone();
            config.with_file(&path)?
        } else {
            config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn auth_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.auth_token_ttl_hours)
    }
}
