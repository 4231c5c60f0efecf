pub mod submission;
pub mod usage;
