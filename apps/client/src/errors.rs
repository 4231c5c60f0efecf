use thiserror::Error;

/// The orchestration stage a submission failed at. Stage labels match the
/// failure tags surfaced to the UI and carried in `GenerationOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    CreditGate,
    ResumeRequest,
    CoverLetterRequest,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::CreditGate => "credit-gate",
            Stage::ResumeRequest => "resume-request",
            Stage::CoverLetterRequest => "cover-letter-request",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Application-level error type.
/// Every kind is recovered at the orchestrator boundary and mapped to a
/// user-visible notification — nothing propagates past the submit handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("No generation credits remaining")]
    CreditExhausted,

    #[error("{stage} failed: {message}")]
    Request { stage: Stage, message: String },

    #[error("Usage storage error: {0}")]
    Storage(String),

    #[error("Unexpected error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The stage this error terminates, if it maps to one. `Storage` and
    /// `Internal` have no stage — they are the unexpected-error kind.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AppError::Validation { .. } => Some(Stage::Validation),
            AppError::CreditExhausted => Some(Stage::CreditGate),
            AppError::Request { stage, .. } => Some(*stage),
            AppError::Storage(_) | AppError::Internal(_) => None,
        }
    }

    /// The message shown in the failure notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { missing } => {
                format!("Please fill in: {}", missing.join(", "))
            }
            AppError::CreditExhausted => {
                "You've used all your free credits. Upgrade to premium for unlimited generations."
                    .to_string()
            }
            AppError::Request {
                stage: Stage::ResumeRequest,
                message,
            } => format!("Resume generation failed: {message}"),
            AppError::Request {
                stage: Stage::CoverLetterRequest,
                message,
            } => format!("Cover letter generation failed: {message}"),
            AppError::Request { stage, message } => format!("{stage} failed: {message}"),
            AppError::Storage(message) => format!("Something went wrong: {message}"),
            AppError::Internal(e) => format!("Something went wrong: {e}"),
        }
    }
}
