//! Form data collection — turns current UI state into an immutable
//! `SubmissionRecord`. Pure: no network, no storage, and calling `collect`
//! twice on an unchanged source yields structurally equal records.

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::models::submission::SubmissionRecord;

/// Every scalar form control, keyed by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CurrentPosition,
    YearsExperience,
    Education,
    Experience,
    TargetPosition,
    Achievements,
    Projects,
    Industry,
    Tone,
    JobDescription,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::CurrentPosition,
        Field::YearsExperience,
        Field::Education,
        Field::Experience,
        Field::TargetPosition,
        Field::Achievements,
        Field::Projects,
        Field::Industry,
        Field::Tone,
        Field::JobDescription,
    ];

    /// Wire name — matches the serialized `SubmissionRecord` field.
    pub fn key(&self) -> &'static str {
        match self {
            Field::CurrentPosition => "current_position",
            Field::YearsExperience => "years_experience",
            Field::Education => "education",
            Field::Experience => "experience",
            Field::TargetPosition => "target_position",
            Field::Achievements => "achievements",
            Field::Projects => "projects",
            Field::Industry => "industry",
            Field::Tone => "tone",
            Field::JobDescription => "job_description",
        }
    }

    /// Label used in validation messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Field::CurrentPosition => "Current Position",
            Field::YearsExperience => "Years of Experience",
            Field::Education => "Education",
            Field::Experience => "Experience",
            Field::TargetPosition => "Target Position",
            Field::Achievements => "Achievements",
            Field::Projects => "Projects",
            Field::Industry => "Industry",
            Field::Tone => "Tone",
            Field::JobDescription => "Job Description",
        }
    }
}

/// Read-only view of the current form state. Implementations must not touch
/// network or storage; the collector is a pure function of this view.
pub trait FormSource: Send + Sync {
    /// Raw value of a scalar control, `None` when the control is absent.
    fn value(&self, field: Field) -> Option<String>;

    /// Ordered skill-tag labels. Duplicates are rejected at entry time by
    /// the tagging UI, not here.
    fn skills(&self) -> Vec<String>;
}

/// Builds a `SubmissionRecord` from the current form state. Every scalar is
/// trimmed; absent controls collapse to the empty string; skill order is
/// preserved.
pub fn collect(source: &dyn FormSource) -> SubmissionRecord {
    let get = |field: Field| {
        source
            .value(field)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    SubmissionRecord {
        current_position: get(Field::CurrentPosition),
        years_experience: get(Field::YearsExperience),
        education: get(Field::Education),
        skills: source.skills(),
        experience: get(Field::Experience),
        target_position: get(Field::TargetPosition),
        achievements: get(Field::Achievements),
        projects: get(Field::Projects),
        industry: get(Field::Industry),
        tone: get(Field::Tone),
        job_description: get(Field::JobDescription),
    }
}

/// Accessor used by validation: the collected value of one scalar field.
pub fn field_value<'a>(record: &'a SubmissionRecord, field: Field) -> &'a str {
    match field {
        Field::CurrentPosition => &record.current_position,
        Field::YearsExperience => &record.years_experience,
        Field::Education => &record.education,
        Field::Experience => &record.experience,
        Field::TargetPosition => &record.target_position,
        Field::Achievements => &record.achievements,
        Field::Projects => &record.projects,
        Field::Industry => &record.industry,
        Field::Tone => &record.tone,
        Field::JobDescription => &record.job_description,
    }
}

/// `FormSource` backed by a JSON object file: scalar controls as string
/// values keyed by their wire names, skills as an array of strings. This is
/// the binary's stand-in for the form UI.
pub struct JsonForm {
    fields: Map<String, Value>,
}

impl JsonForm {
    pub fn from_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("Form file is not valid JSON")?;
        let fields = value
            .as_object()
            .context("Form file must be a JSON object")?
            .clone();
        Ok(JsonForm { fields })
    }

    pub async fn load(path: &str) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read form file '{path}'"))?;
        Self::from_str(&raw)
    }
}

impl FormSource for JsonForm {
    fn value(&self, field: Field) -> Option<String> {
        self.fields
            .get(field.key())
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn skills(&self) -> Vec<String> {
        self.fields
            .get("skills")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
