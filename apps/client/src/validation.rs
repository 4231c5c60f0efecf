//! Submission validation — the required-field check that runs before the
//! credit gate and before any network request.

use crate::errors::AppError;
use crate::form::{field_value, Field};
use crate::models::submission::SubmissionRecord;

/// Fields that must be non-empty after trimming for a submission to proceed.
pub const REQUIRED_FIELDS: [Field; 4] = [
    Field::CurrentPosition,
    Field::YearsExperience,
    Field::TargetPosition,
    Field::Industry,
];

/// Checks every required field and reports the full list of missing ones, so
/// the user fixes the form in one pass instead of one field at a time.
pub fn validate(record: &SubmissionRecord) -> Result<(), AppError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| field_value(record, **field).trim().is_empty())
        .map(|field| field.display_name().to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation { missing })
    }
}
