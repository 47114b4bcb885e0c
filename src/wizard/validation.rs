// src/wizard/validation.rs
//! Field-level validation for section forms

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::cv_data::{field_list, field_text, value_is_blank, Record, SectionValue};
use crate::types::section::{FieldKind, FieldSpec, SectionKey};

/// Location of a field inside a section form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPath {
    pub section: SectionKey,
    pub record: usize,
    pub field: String,
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}].{}", self.section, self.record, self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: FieldPath,
    pub message: String,
}

/// All failures of one validation pass, in on-screen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// The field to bring into view.
    pub fn first_invalid(&self) -> Option<&FieldPath> {
        self.errors.first().map(|e| &e.path)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates every record of a section value.
pub fn validate_section(key: SectionKey, value: &SectionValue) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = value
        .records()
        .iter()
        .enumerate()
        .flat_map(|(index, record)| validate_record(key, index, record))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

fn validate_record(key: SectionKey, index: usize, record: &Record) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for spec in key.fields() {
        if let Some(message) = check_field(spec, record) {
            errors.push(FieldError {
                path: FieldPath {
                    section: key,
                    record: index,
                    field: spec.name.to_string(),
                },
                message,
            });
        }
    }

    if let Some((start_field, end_field)) = key.date_range() {
        let already_flagged = errors.iter().any(|e| e.path.field == end_field);
        let start = field_text(record, start_field).and_then(parse_partial_date);
        let end = field_text(record, end_field).and_then(parse_partial_date);
        if let (Some(start), Some(end), false) = (start, end, already_flagged) {
            if end < start {
                errors.push(FieldError {
                    path: FieldPath {
                        section: key,
                        record: index,
                        field: end_field.to_string(),
                    },
                    message: format!("{} must not be before {}", end_field, start_field),
                });
            }
        }
    }

    errors
}

fn check_field(spec: &FieldSpec, record: &Record) -> Option<String> {
    let value = record.get(spec.name).filter(|v| !value_is_blank(v));

    match spec.kind {
        FieldKind::MultiSelect => {
            if value.is_some_and(|v| !is_option_list(v)) {
                return Some(format!("{} must be a list of options", spec.name));
            }
            if spec.required && field_list(record, spec.name).is_empty() {
                return Some(format!("Select at least one {}", spec.name));
            }
            None
        }
        FieldKind::Flag => match value {
            None => spec.required.then(|| format!("{} is required", spec.name)),
            Some(Value::Bool(_)) => None,
            Some(_) => Some(format!("{} must be true or false", spec.name)),
        },
        _ => {
            let Some(value) = value else {
                return spec
                    .required
                    .then(|| format!("{} is required", spec.name));
            };
            let Some(text) = value.as_str().map(str::trim) else {
                return Some(format!("{} must be text", spec.name));
            };
            match spec.kind {
                FieldKind::Email if !is_valid_email(text) => {
                    Some(format!("{} must be a valid email address", spec.name))
                }
                FieldKind::Date if parse_partial_date(text).is_none() => {
                    Some(format!("{} must be formatted as YYYY-MM or YYYY-MM-DD", spec.name))
                }
                FieldKind::Year if !is_valid_year(text) => {
                    Some(format!("{} must be a four-digit year", spec.name))
                }
                _ => None,
            }
        }
    }
}

/// A bare string, or an array of strings and `{label, value}` option objects.
fn is_option_list(value: &Value) -> bool {
    fn is_option(item: &Value) -> bool {
        match item {
            Value::String(_) => true,
            Value::Object(map) => map
                .get("value")
                .or_else(|| map.get("label"))
                .is_some_and(Value::is_string),
            _ => false,
        }
    }

    match value {
        Value::String(_) => true,
        Value::Array(items) => items.iter().all(is_option),
        _ => false,
    }
}

/// Accepts `YYYY-MM-DD` and `YYYY-MM` (first of the month).
pub fn parse_partial_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
        .ok()
}

fn is_valid_year(text: &str) -> bool {
    text.len() == 4
        && text.chars().all(|c| c.is_ascii_digit())
        && text.parse::<u32>().is_ok_and(|y| y >= 1900)
}

fn is_valid_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
