//! Client-side validation of dynamic form data.
//!
//! Mirrors the checks the API performs so that problems can be shown next to
//! the offending field before a request is sent.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::entities::{FieldType, FormField, ValidationRules};
use crate::domain::errors::FieldErrors;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validates submitted values against the fields of a form.
///
/// # Errors
/// Returns a message per offending field. Keys absent from `fields` are
/// reported as unexpected.
pub fn validate_submission_data(
    fields: &[FormField],
    data: &Map<String, Value>,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for key in data.keys() {
        if !fields.iter().any(|field| &field.name == key) {
            errors.insert(key.clone(), "Unexpected field");
        }
    }

    for field in fields {
        if let Some(message) = check_field(field, data.get(&field.name)) {
            errors.insert(field.name.clone(), message);
        }
    }

    errors.into_result()
}

fn check_field(field: &FormField, value: Option<&Value>) -> Option<String> {
    let name = &field.name;

    if field.required {
        let missing = match field.field_type {
            FieldType::Checkbox => value.map(selection).unwrap_or_default().is_empty(),
            FieldType::Boolean => {
                if !value.is_some_and(is_true) {
                    return Some(format!("{name} must be checked"));
                }
                false
            }
            _ => !value.is_some_and(is_present),
        };
        if missing {
            return Some(format!("{name} is required"));
        }
    }

    let value = value.filter(|value| is_present(value))?;
    let rules = field.rules();

    check_type(field, value)
        .or_else(|| check_rules(field, &rules, value))
        .or_else(|| check_choices(field, &rules, value))
}

fn check_type(field: &FormField, value: &Value) -> Option<String> {
    match field.field_type {
        FieldType::Number if as_number(value).is_none() => Some("Must be a number".to_string()),
        FieldType::Date
            if value
                .as_str()
                .is_none_or(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_err()) =>
        {
            Some("Must be a valid date (YYYY-MM-DD)".to_string())
        }
        FieldType::Boolean if as_bool(value).is_none() => Some("Must be a boolean".to_string()),
        FieldType::Email if !value.as_str().is_some_and(|s| EMAIL_PATTERN.is_match(s)) => {
            Some("Invalid email".to_string())
        }
        FieldType::Url
            if value
                .as_str()
                .is_none_or(|s| reqwest::Url::parse(s.trim()).is_err()) =>
        {
            Some("Invalid URL".to_string())
        }
        _ => None,
    }
}

fn check_rules(field: &FormField, rules: &ValidationRules, value: &Value) -> Option<String> {
    let name = &field.name;

    match field.field_type {
        FieldType::Text => {
            let text = as_text(value)?;
            let length = text.chars().count();

            if let Some(min) = rules.min_length
                && length < min
            {
                return Some(format!("'{name}' must be at least {min} characters"));
            }
            if let Some(max) = rules.max_length
                && length > max
            {
                return Some(format!("'{name}' exceeds {max} characters"));
            }
            if let Some(pattern) = &rules.regex {
                // Anchored at the start only, like the API's matcher.
                let matches = Regex::new(&format!("^(?:{pattern})"))
                    .map(|re| re.is_match(&text))
                    .unwrap_or(false);
                if !matches {
                    return Some(format!("'{name}' does not match pattern"));
                }
            }
            None
        }
        FieldType::Number => {
            let number = as_number(value)?;

            if let Some(min) = rules.min_value
                && number < min
            {
                return Some(format!("'{name}' must be at least {min}"));
            }
            if let Some(max) = rules.max_value
                && number > max
            {
                return Some(format!("'{name}' must be at most {max}"));
            }
            None
        }
        _ => None,
    }
}

fn check_choices(field: &FormField, rules: &ValidationRules, value: &Value) -> Option<String> {
    let choices = rules.choices();
    if choices.is_empty() {
        return None;
    }

    match field.field_type {
        FieldType::Select | FieldType::Radio => {
            let text = as_text(value).unwrap_or_default();
            (!choices.contains(&text))
                .then(|| format!("'{}' must be one of: {}", field.name, choices.join(", ")))
        }
        FieldType::Checkbox => {
            let invalid: Vec<String> = selection(value)
                .into_iter()
                .filter(|choice| !choices.contains(choice))
                .collect();
            (!invalid.is_empty())
                .then(|| format!("'{}' invalid choices: {}", field.name, invalid.join(", ")))
        }
        _ => None,
    }
}

/// Checks a field definition and normalizes its choice list.
///
/// Choice fields need at least one non-blank choice. Choices are trimmed,
/// blanks dropped and duplicates removed, keeping first occurrences.
///
/// # Errors
/// Returns an error keyed `validation_rules` when the definition is unusable.
pub fn normalize_field_definition(field: &mut FormField) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if field.field_type.is_choice() {
        let mut rules = field.rules();
        match rules.choices.as_deref() {
            None | Some([]) => errors.insert(
                "validation_rules",
                "choices are required for select/radio/checkbox fields.",
            ),
            Some(raw) => {
                let mut cleaned: Vec<String> = Vec::with_capacity(raw.len());
                for choice in raw.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
                    if !cleaned.iter().any(|existing| existing == choice) {
                        cleaned.push(choice.to_string());
                    }
                }

                if cleaned.is_empty() {
                    errors.insert("validation_rules", "choices cannot be empty.");
                } else {
                    rules.choices = Some(cleaned);
                    field.validation_rules = Some(rules);
                }
            }
        }
    }

    if let Some(pattern) = field.validation_rules.as_ref().and_then(|r| r.regex.as_ref())
        && Regex::new(pattern).is_err()
    {
        errors.insert("validation_rules", "regex is not a valid pattern.");
    }

    errors.into_result()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn is_true(value: &Value) -> bool {
    as_bool(value) == Some(true)
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn selection(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        other => as_text(other)
            .map(|text| {
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn check(field: FormField, value: Value) -> Option<String> {
        let name = field.name.clone();
        let mut submitted = Map::new();
        submitted.insert(name.clone(), value);
        validate_submission_data(&[field], &submitted)
            .err()
            .and_then(|errors| errors.get(&name).map(str::to_string))
    }

    #[test]
    fn test_unexpected_field_reported() {
        let fields = [FormField::new("notes", FieldType::Text)];
        let errors = validate_submission_data(&fields, &data(json!({"extra": 1}))).unwrap_err();

        assert_eq!(errors.get("extra"), Some("Unexpected field"));
    }

    #[test]
    fn test_optional_blank_field_skipped() {
        let field = FormField::new("weight", FieldType::Number);
        assert_eq!(check(field, json!("  ")), None);
    }

    #[test_case(FieldType::Text, json!("") ; "blank_text")]
    #[test_case(FieldType::Number, Value::Null ; "null_number")]
    #[test_case(FieldType::Checkbox, json!(",,") ; "empty_checkbox")]
    #[test_case(FieldType::Checkbox, json!([]) ; "empty_checkbox_array")]
    fn test_required_missing(field_type: FieldType, value: Value) {
        let field = FormField::new("f", field_type).required();
        assert_eq!(check(field, value).as_deref(), Some("f is required"));
    }

    #[test]
    fn test_required_boolean_must_be_checked() {
        let field = FormField::new("agreed", FieldType::Boolean).required();
        assert_eq!(
            check(field.clone(), json!(false)).as_deref(),
            Some("agreed must be checked")
        );
        assert_eq!(check(field, json!("true")), None);
    }

    #[test_case(FieldType::Number, json!("12.5"), None ; "number_string_ok")]
    #[test_case(FieldType::Number, json!("abc"), Some("Must be a number") ; "number_invalid")]
    #[test_case(FieldType::Date, json!("2024-02-29"), None ; "date_ok")]
    #[test_case(FieldType::Date, json!("29/02/2024"), Some("Must be a valid date (YYYY-MM-DD)") ; "date_invalid")]
    #[test_case(FieldType::Email, json!("a@b.co"), None ; "email_ok")]
    #[test_case(FieldType::Email, json!("a@b"), Some("Invalid email") ; "email_invalid")]
    #[test_case(FieldType::Url, json!("https://example.com/x"), None ; "url_ok")]
    #[test_case(FieldType::Url, json!("not a url"), Some("Invalid URL") ; "url_invalid")]
    #[test_case(FieldType::Boolean, json!("yes"), Some("Must be a boolean") ; "boolean_invalid")]
    fn test_type_checks(field_type: FieldType, value: Value, expected: Option<&str>) {
        let field = FormField::new("f", field_type);
        assert_eq!(check(field, value).as_deref(), expected);
    }

    #[test]
    fn test_text_length_rules() {
        let rules = ValidationRules {
            min_length: Some(3),
            max_length: Some(5),
            ..ValidationRules::default()
        };
        let field = FormField::new("code", FieldType::Text).with_rules(rules);

        assert!(check(field.clone(), json!("ab")).is_some());
        assert!(check(field.clone(), json!("abcdef")).is_some());
        assert_eq!(check(field, json!("abcd")), None);
    }

    #[test]
    fn test_regex_anchored_at_start() {
        let rules = ValidationRules {
            regex: Some("[A-Z]{2}".to_string()),
            ..ValidationRules::default()
        };
        let field = FormField::new("lot", FieldType::Text).with_rules(rules);

        assert_eq!(check(field.clone(), json!("AB-12")), None);
        assert_eq!(
            check(field, json!("x-AB")).as_deref(),
            Some("'lot' does not match pattern")
        );
    }

    #[test]
    fn test_number_bounds() {
        let rules = ValidationRules {
            min_value: Some(0.0),
            max_value: Some(100.0),
            ..ValidationRules::default()
        };
        let field = FormField::new("pct", FieldType::Number).with_rules(rules);

        assert!(check(field.clone(), json!(-1)).is_some());
        assert!(check(field.clone(), json!("101")).is_some());
        assert_eq!(check(field, json!(50)), None);
    }

    #[test]
    fn test_select_choices() {
        let field = FormField::new("grade", FieldType::Select)
            .with_rules(ValidationRules::with_choices(["A", "B"]));

        assert_eq!(check(field.clone(), json!("A")), None);
        assert_eq!(
            check(field, json!("C")).as_deref(),
            Some("'grade' must be one of: A, B")
        );
    }

    #[test]
    fn test_checkbox_choices_from_list_or_csv() {
        let field = FormField::new("tags", FieldType::Checkbox)
            .with_rules(ValidationRules::with_choices(["x", "y", "z"]));

        assert_eq!(check(field.clone(), json!("x, z")), None);
        assert_eq!(check(field.clone(), json!(["y"])), None);
        assert_eq!(
            check(field, json!("x,w")).as_deref(),
            Some("'tags' invalid choices: w")
        );
    }

    #[test]
    fn test_normalize_requires_choices() {
        let mut field = FormField::new("kind", FieldType::Select);
        let errors = normalize_field_definition(&mut field).unwrap_err();
        assert!(errors.get("validation_rules").is_some());

        let mut field = FormField::new("kind", FieldType::Select)
            .with_rules(ValidationRules::with_choices(["  ", ""]));
        let errors = normalize_field_definition(&mut field).unwrap_err();
        assert_eq!(errors.get("validation_rules"), Some("choices cannot be empty."));
    }

    #[test]
    fn test_normalize_rejects_bad_regex() {
        let rules = ValidationRules {
            regex: Some("(".to_string()),
            ..ValidationRules::default()
        };
        let mut field = FormField::new("code", FieldType::Text).with_rules(rules);
        assert!(normalize_field_definition(&mut field).is_err());
    }

    #[test]
    fn test_normalize_leaves_plain_fields_alone() {
        let mut field = FormField::new("notes", FieldType::Text);
        assert!(normalize_field_definition(&mut field).is_ok());
        assert!(field.validation_rules.is_none());
    }
}
