//! Batch records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::form::Form;
use super::record::RecordStatus;
use crate::domain::errors::FieldErrors;
use crate::domain::services::validation;

/// A production batch as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: u64,
    /// Generated batch code.
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<u64>,
    pub country: String,
    pub production_type: String,
    pub production_date: DateTime<Utc>,
    #[serde(default)]
    pub form_gate_sourced: bool,
    pub cluster_group: String,
    pub quantity: i64,
    pub uoms: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub form: Option<u64>,
    #[serde(default)]
    pub form_data: Option<Map<String, Value>>,
    /// Number of bags in this batch.
    #[serde(default)]
    pub bag_counts: u64,
}

/// Payload for creating or replacing a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchDraft {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub production_type: String,
    #[serde(default)]
    pub production_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub form_gate_sourced: bool,
    #[serde(default)]
    pub cluster_group: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub uoms: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Map<String, Value>>,
}

impl BatchDraft {
    /// Validates required attributes and, when a form is attached, its data.
    ///
    /// Dynamic form errors are keyed `dynamic_<field>`.
    ///
    /// # Errors
    /// Returns the collected field errors.
    pub fn validate(&self, form: Option<&Form>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let required = [
            ("country", &self.country, "Country is required"),
            ("production_type", &self.production_type, "Production Type is required"),
            ("cluster_group", &self.cluster_group, "Cluster Group is required"),
            ("uoms", &self.uoms, "UOM is required"),
        ];
        for (key, value, message) in required {
            if value.trim().is_empty() {
                errors.insert(key, message);
            }
        }

        if self.production_date.is_none() {
            errors.insert("production_date", "Production Date is required");
        }
        if self.quantity <= 0 {
            errors.insert("quantity", "Quantity must be positive");
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
