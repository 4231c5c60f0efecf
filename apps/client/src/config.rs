use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the generation API, e.g. `http://localhost:8080/api/v1`.
    pub api_base_url: String,
    /// Per-request timeout. Default 120s, matching the backend's own
    /// generation deadline.
    pub request_timeout: Duration,
    /// Path of the persisted plan/credits file.
    pub usage_path: PathBuf,
    /// Directory generated documents are saved into.
    pub download_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: require_env("QUICKHIRE_API_URL")?,
            request_timeout: Duration::from_secs(
                std::env::var("QUICKHIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse::<u64>()
                    .context("QUICKHIRE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            usage_path: std::env::var("QUICKHIRE_USAGE_PATH")
                .unwrap_or_else(|_| "usage.json".to_string())
                .into(),
            download_dir: std::env::var("QUICKHIRE_DOWNLOAD_DIR")
                .unwrap_or_else(|_| "downloads".to_string())
                .into(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
