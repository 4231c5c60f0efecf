//! Generation API client — the single point of entry for both document
//! endpoints. No other module issues HTTP requests.
//!
//! No retries: a transport error, timeout, or non-success status is terminal
//! for the submission and surfaces as a stage-tagged failure.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AppError, Stage};
use crate::models::submission::SubmissionRecord;

pub const RESUME_ENDPOINT: &str = "/generate-resume";
pub const COVER_LETTER_ENDPOINT: &str = "/generate-cover-letter";

/// Max response-body characters carried into a failure message.
const BODY_EXCERPT_CHARS: usize = 200;

/// The two document kinds the backend can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Resume,
    CoverLetter,
}

impl ArtifactKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ArtifactKind::Resume => RESUME_ENDPOINT,
            ArtifactKind::CoverLetter => COVER_LETTER_ENDPOINT,
        }
    }

    /// The orchestration stage a failed request for this kind maps to.
    pub fn stage(&self) -> Stage {
        match self {
            ArtifactKind::Resume => Stage::ResumeRequest,
            ArtifactKind::CoverLetter => Stage::CoverLetterRequest,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ArtifactKind::Resume => "resume",
            ArtifactKind::CoverLetter => "cover_letter",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ArtifactKind::Resume => "resume",
            ArtifactKind::CoverLetter => "cover letter",
        }
    }

    /// Download filename, keyed by the per-submission request id.
    pub fn filename(&self, request_id: Uuid) -> String {
        format!("{}_{}.pdf", self.slug(), request_id)
    }
}

/// A generated binary document held in memory until both documents of a
/// submission have arrived.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub bytes: Bytes,
}

/// Document generation capability. Carried by the orchestrator as
/// `Arc<dyn DocumentGenerator>` so tests can script responses.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn generate(
        &self,
        kind: ArtifactKind,
        record: &SubmissionRecord,
    ) -> Result<Artifact, AppError>;
}

/// HTTP implementation over the two generation endpoints. POSTs the
/// serialized `SubmissionRecord` as JSON and reads the binary response.
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
}

impl HttpGenerationClient {
    /// `timeout` bounds each request end to end, so a hung backend surfaces
    /// as a stage failure instead of hanging the orchestration.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        HttpGenerationClient {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DocumentGenerator for HttpGenerationClient {
    async fn generate(
        &self,
        kind: ArtifactKind,
        record: &SubmissionRecord,
    ) -> Result<Artifact, AppError> {
        let url = format!("{}{}", self.base_url, kind.endpoint());
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| AppError::Request {
                stage: kind.stage(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} generation returned {status}", kind.display_name());
            return Err(AppError::Request {
                stage: kind.stage(),
                message: format!("HTTP {}: {}", status.as_u16(), excerpt(&body)),
            });
        }

        let bytes = response.bytes().await.map_err(|e| AppError::Request {
            stage: kind.stage(),
            message: format!("reading response body: {e}"),
        })?;

        debug!("{} artifact received: {} bytes", kind.display_name(), bytes.len());
        Ok(Artifact { kind, bytes })
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() > BODY_EXCERPT_CHARS {
        body.chars().take(BODY_EXCERPT_CHARS).collect::<String>() + "…"
    } else {
        body.to_string()
    }
}
