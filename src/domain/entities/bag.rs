//! Bag records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::form::Form;
use super::record::RecordStatus;
use crate::domain::errors::FieldErrors;
use crate::domain::services::validation;

/// A bag belonging to a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    pub bag_id: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub batch: u64,
    pub internal_lot_number: String,
    pub state: String,
    pub qr_code: String,
    pub external_lot_number: String,
    pub external_update_date: DateTime<Utc>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub form: Option<u64>,
    #[serde(default)]
    pub form_data: Option<Map<String, Value>>,
}

/// Payload for creating or replacing a bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BagDraft {
    #[serde(default)]
    pub batch: Option<u64>,
    #[serde(default)]
    pub internal_lot_number: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub qr_code: String,
    #[serde(default)]
    pub external_lot_number: String,
    #[serde(default)]
    pub external_update_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Map<String, Value>>,
}

impl BagDraft {
    /// Validates required attributes and attached form data.
    ///
    /// # Errors
    /// Returns the collected field errors.
    pub fn validate(&self, form: Option<&Form>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.batch.is_none() {
            errors.insert("batch", "batch is required");
        }

        let required = [
            ("internal_lot_number", &self.internal_lot_number),
            ("state", &self.state),
            ("qr_code", &self.qr_code),
            ("external_lot_number", &self.external_lot_number),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                errors.insert(key, format!("{} is required", key.replace('_', " ")));
            }
        }

        if self.external_update_date.is_none() {
            errors.insert("external_update_date", "external update date is required");
        }

        if let Some(form) = form {
            let data = self.form_data.clone().unwrap_or_default();
            if let Err(form_errors) = validation::validate_submission_data(&form.fields, &data) {
                errors.merge_prefixed("dynamic_", form_errors);
            }
        }

        errors.into_result()
    }
}
