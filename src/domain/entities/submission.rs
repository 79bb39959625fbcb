//! Form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::form::Form;
use super::record::AssociationType;
use crate::domain::errors::FieldErrors;
use crate::domain::services::validation;

/// A stored submission of form data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: u64,
    pub form: u64,
    #[serde(default)]
    pub content_type: Option<u64>,
    #[serde(default)]
    pub object_id: Option<u64>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Username of the submitter.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Payload for creating or replacing a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub form: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u64>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl SubmissionDraft {
    /// Validates the draft against the form it targets.
    ///
    /// # Errors
    /// Returns the collected field errors.
    pub fn validate(&self, form: &Form) -> Result<(), FieldErrors> {
        let mut errors = match validation::validate_submission_data(&form.fields, &self.data) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors,
        };

        let attached = self.content_type.is_some() || self.object_id.is_some();
        match form.association_type {
            AssociationType::Standalone if attached => {
                errors.insert(
                    "object_id",
                    "Standalone forms cannot have content objects.",
                );
            }
            AssociationType::Batch | AssociationType::Bag
                if self.content_type.is_none() || self.object_id.is_none() =>
            {
                errors.insert("object_id", "Content type and object ID are required.");
            }
            _ => {}
        }

        errors.into_result()
    }
}

/// Filters for listing submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub form: Option<u64>,
    pub association_type: Option<AssociationType>,
}

impl SubmissionQuery {
    /// Returns the filters as query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(form) = self.form {
            pairs.push(("form".to_string(), form.to_string()));
        }
        if let Some(association) = self.association_type {
            pairs.push(("association_type".to_string(), association.to_string()));
        }
        pairs
    }
}
