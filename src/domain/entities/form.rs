//! Form definitions and their fields.

use serde::{Deserialize, Serialize};

use super::record::AssociationType;
use crate::domain::errors::FieldErrors;
use crate::domain::services::validation;

/// Input kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Select,
    Radio,
    Checkbox,
    Email,
    Url,
}

impl FieldType {
    /// Returns whether the field picks from a list of choices.
    #[must_use]
    pub const fn is_choice(self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::Checkbox)
    }
}

/// Constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(
        default,
        deserialize_with = "crate::domain::serde_utils::choice_list::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub choices: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl ValidationRules {
    /// Creates rules holding only a choice list.
    #[must_use]
    pub fn with_choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: Some(choices.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Returns the choice list, empty when unset.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        self.choices.as_deref().unwrap_or_default()
    }
}

/// A field of a stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_field_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validation_rules: Option<ValidationRules>,
}

impl FormField {
    /// Creates a new unsaved field.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            form_field_id: None,
            form: None,
            name: name.into(),
            description: None,
            field_type,
            required: false,
            validation_rules: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets validation rules.
    #[must_use]
    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    /// Returns the rules, or defaults when none are set.
    #[must_use]
    pub fn rules(&self) -> ValidationRules {
        self.validation_rules.clone().unwrap_or_default()
    }
}

/// A stored form with its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub form_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub association_type: AssociationType,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// Payload for creating or replacing a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub association_type: AssociationType,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormDraft {
    /// Checks required attributes and normalizes field definitions.
    ///
    /// Field errors are keyed `fieldName_<index>`, rule problems `<index>_validation_rules`.
    ///
    /// # Errors
    /// Returns the collected field errors.
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", "Form Name is required");
        }
        if self.description.trim().is_empty() {
            errors.insert("description", "Description is required");
        }

        for (index, field) in self.fields.iter_mut().enumerate() {
            if field.name.trim().is_empty() {
                errors.insert(format!("fieldName_{index}"), "Field name is required");
            }
            if let Err(field_errors) = validation::normalize_field_definition(field) {
                errors.merge_prefixed(&format!("{index}_"), field_errors);
            }
        }

        errors.into_result()
    }
}
