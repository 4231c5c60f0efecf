use serde::{Deserialize, Serialize};

/// Immutable snapshot of the career-profile form, built once per submission
/// attempt and never mutated afterwards.
///
/// Field names are the wire contract: this struct is serialized as-is into
/// the request body of both generation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub current_position: String,
    pub years_experience: String,
    pub education: String,
    /// Ordered skill-tag labels, exactly as entered in the tagging UI.
    pub skills: Vec<String>,
    pub experience: String,
    pub target_position: String,
    pub achievements: String,
    pub projects: String,
    pub industry: String,
    pub tone: String,
    pub job_description: String,
}
