//! Persisted usage state — plan and credit balance that survive restarts.
//!
//! The store is an explicit, injected capability rather than ambient global
//! storage: the credit gate reads through it and the post-success decrement
//! commits through it, so the all-or-nothing accounting is testable in
//! isolation.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::models::usage::{Plan, UsageState};

pub const PLAN_KEY: &str = "plan";
pub const CREDITS_KEY: &str = "credits";

/// Read/write access to the persisted `UsageState`. Carried by the
/// orchestrator as `Arc<dyn UsageStore>`.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn read(&self) -> Result<UsageState, AppError>;
    async fn commit(&self, state: &UsageState) -> Result<(), AppError>;
}

/// JSON key-value file mirroring the original storage contract: both values
/// persisted as strings (`{"plan": "free", "credits": "1"}`). An absent file
/// or malformed value falls back to the first-run defaults.
pub struct FileUsageStore {
    path: PathBuf,
}

impl FileUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileUsageStore { path: path.into() }
    }
}

#[async_trait]
impl UsageStore for FileUsageStore {
    async fn read(&self) -> Result<UsageState, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UsageState::default());
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "reading {}: {e}",
                    self.path.display()
                )));
            }
        };

        let map: Map<String, Value> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "Usage file {} is not valid JSON ({e}), using defaults",
                    self.path.display()
                );
                return Ok(UsageState::default());
            }
        };

        Ok(parse_usage(&map))
    }

    async fn commit(&self, state: &UsageState) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Storage(format!("creating {}: {e}", parent.display()))
                })?;
            }
        }

        let map = json!({
            PLAN_KEY: state.plan.as_str(),
            CREDITS_KEY: state.credits.to_string(),
        });
        let raw = serde_json::to_string_pretty(&map)
            .map_err(|e| AppError::Storage(format!("serializing usage state: {e}")))?;

        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| AppError::Storage(format!("writing {}: {e}", self.path.display())))
    }
}

/// Per-value parsing with defaults: each key degrades independently, the way
/// the original key-value storage did.
fn parse_usage(map: &Map<String, Value>) -> UsageState {
    let defaults = UsageState::default();

    let plan = map
        .get(PLAN_KEY)
        .and_then(|v| v.as_str())
        .map(Plan::parse)
        .unwrap_or(defaults.plan);

    let credits = map
        .get(CREDITS_KEY)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(defaults.credits);

    UsageState { plan, credits }
}
