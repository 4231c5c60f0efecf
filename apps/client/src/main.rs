mod config;
mod download;
mod errors;
mod form;
mod generation_client;
mod models;
mod orchestrator;
mod ui;
mod usage_store;
mod validation;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::download::FileSink;
use crate::form::JsonForm;
use crate::generation_client::HttpGenerationClient;
use crate::orchestrator::{GenerationOrchestrator, GenerationOutcome};
use crate::ui::ConsoleUi;
use crate::usage_store::FileUsageStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting QuickHire client v{}", env!("CARGO_PKG_VERSION"));

    let form_path = std::env::args()
        .nth(1)
        .context("Usage: client <form.json>")?;
    let form = JsonForm::load(&form_path).await?;

    let orchestrator = GenerationOrchestrator::new(
        Arc::new(FileUsageStore::new(&config.usage_path)),
        Arc::new(HttpGenerationClient::new(
            config.api_base_url.as_str(),
            config.request_timeout,
        )),
        Arc::new(FileSink::new(&config.download_dir)),
        Arc::new(ConsoleUi),
    );

    match orchestrator.submit(&form).await {
        Some(GenerationOutcome::Success { .. }) => {
            info!("Documents saved to {}", config.download_dir.display());
            Ok(())
        }
        Some(GenerationOutcome::Failure { stage, reason }) => match stage {
            Some(stage) => bail!("Generation failed at {stage}: {reason}"),
            None => bail!("Generation failed: {reason}"),
        },
        // A fresh orchestrator has nothing in flight
        None => Ok(()),
    }
}
