//! Artifact downloads — client-side save of the generated documents.

use std::path::PathBuf;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::generation_client::Artifact;

/// Save capability for generated artifacts. An I/O failure here is part of
/// the owning submission's failure path, not its own user-facing error kind.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, artifact: &Artifact, filename: &str) -> Result<(), AppError>;
}

/// Writes each artifact to its own file under `dir`. Every call opens and
/// releases its own handle; nothing is shared between calls.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSink { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn save(&self, artifact: &Artifact, filename: &str) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(anyhow!("creating {}: {e}", self.dir.display())))?;

        let path = self.dir.join(filename);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow!("saving {}: {e}", path.display())))?;

        info!(
            "Saved {} ({} bytes) to {}",
            artifact.kind.display_name(),
            artifact.bytes.len(),
            path.display()
        );
        Ok(())
    }
}
