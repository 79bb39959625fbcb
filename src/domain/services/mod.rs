//! Pure domain services.

pub mod validation;

pub use validation::{normalize_field_definition, validate_submission_data};
