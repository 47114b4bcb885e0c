// src/types/cv_data.rs
//! Aggregated CV data: one value per section, assembled by the wizard

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::app_log;
use crate::types::section::{
    FieldKind, SectionKey, CREDENTIALS, DEGREE_TITLE, FIRST_NAME, FULL_NAME, LAST_NAME, MIDDLE_NAME,
};

/// Field name to value; values are strings, string lists, booleans or null.
pub type Record = serde_json::Map<String, Value>;

// ===== Section Values =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    Repeated(Vec<Record>),
    Single(Record),
}

impl SectionValue {
    /// Empty template used when a form mounts without prefill.
    pub fn template(key: SectionKey) -> Self {
        let record = empty_record(key);
        if key.is_repeatable() {
            SectionValue::Repeated(vec![record])
        } else {
            SectionValue::Single(record)
        }
    }

    pub fn records(&self) -> &[Record] {
        match self {
            SectionValue::Repeated(records) => records,
            SectionValue::Single(record) => std::slice::from_ref(record),
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            SectionValue::Repeated(records) => records,
            SectionValue::Single(record) => vec![record],
        }
    }

    /// True when there is no record, or every record only holds blank values.
    pub fn is_empty(&self) -> bool {
        self.records().iter().all(record_is_blank)
    }

    /// Coerce to the shape the section expects: single sections keep their
    /// first record, repeatable sections wrap a lone record in a list.
    pub fn shaped_for(self, key: SectionKey) -> Self {
        match (key.is_repeatable(), self) {
            (true, SectionValue::Single(record)) => SectionValue::Repeated(vec![record]),
            (false, SectionValue::Repeated(records)) => {
                SectionValue::Single(records.into_iter().next().unwrap_or_default())
            }
            (_, value) => value,
        }
    }
}

/// A record with every field of the section present and blank.
pub fn empty_record(key: SectionKey) -> Record {
    key.fields()
        .iter()
        .map(|spec| {
            let blank = match spec.kind {
                FieldKind::MultiSelect => Value::Array(Vec::new()),
                FieldKind::Flag => Value::Bool(false),
                _ => Value::String(String::new()),
            };
            (spec.name.to_string(), blank)
        })
        .collect()
}

pub fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(value_is_blank),
        Value::Object(map) => map.values().all(value_is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn record_is_blank(record: &Record) -> bool {
    record
        .values()
        .all(|v| value_is_blank(v) || matches!(v, Value::Bool(false)))
}

/// Trimmed, non-empty text of a field.
pub fn field_text<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    record
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Items of a multi-select field. Accepts plain strings and `{label, value}`
/// option objects; a bare string is treated as a single item.
pub fn field_list(record: &Record, name: &str) -> Vec<String> {
    fn item_text(item: &Value) -> Option<String> {
        match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("value")
                .or_else(|| map.get("label"))
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        }
    }

    match record.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(item_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

// ===== Personal Information Derivations =====

/// "MD, MPH" from a Degree Title list.
pub fn derive_credentials(record: &Record) -> String {
    field_list(record, DEGREE_TITLE).join(", ")
}

/// First, middle and last name joined by single spaces, blanks skipped.
pub fn derive_full_name(record: &Record) -> String {
    [FIRST_NAME, MIDDLE_NAME, LAST_NAME]
        .iter()
        .filter_map(|field| field_text(record, field))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes the derived `Credentials` and `Full Name` fields into the record.
pub fn apply_personal_derivations(record: &mut Record) {
    let credentials = derive_credentials(record);
    let full_name = derive_full_name(record);
    record.insert(CREDENTIALS.to_string(), Value::String(credentials));
    record.insert(FULL_NAME.to_string(), Value::String(full_name));
}

// ===== Aggregated CV Data =====

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct AggregatedCvData {
    sections: BTreeMap<SectionKey, SectionValue>,
}

impl AggregatedCvData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: SectionKey) -> Option<&SectionValue> {
        self.sections.get(&key)
    }

    /// Stores a section value, shaped for the section.
    pub fn set(&mut self, key: SectionKey, value: SectionValue) {
        self.sections.insert(key, value.shaped_for(key));
    }

    pub fn records(&self, key: SectionKey) -> &[Record] {
        self.get(key).map(SectionValue::records).unwrap_or(&[])
    }

    /// Present and holding at least one non-blank record.
    pub fn has_content(&self, key: SectionKey) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn personal_information(&self) -> Option<&Record> {
        self.records(SectionKey::PersonalInformation).first()
    }

    pub fn full_name(&self) -> Option<String> {
        self.personal_information().and_then(|record| {
            field_text(record, FULL_NAME)
                .map(str::to_string)
                .or_else(|| Some(derive_full_name(record)))
                .filter(|name| !name.is_empty())
        })
    }

    pub fn sections(&self) -> impl Iterator<Item = (SectionKey, &SectionValue)> {
        self.sections.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(SectionValue::is_empty)
    }
}

impl Serialize for AggregatedCvData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sections.serialize(serializer)
    }
}

impl From<BTreeMap<String, Value>> for AggregatedCvData {
    /// Lenient conversion for uploaded or previously saved CVs: unknown keys
    /// and malformed sections are dropped rather than failing the whole CV.
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut data = AggregatedCvData::new();
        for (name, value) in raw {
            let key = match name.parse::<SectionKey>() {
                Ok(key) => key,
                Err(_) => {
                    app_log!(debug, "Ignoring unknown CV section: {}", name);
                    continue;
                }
            };
            if value.is_null() {
                continue;
            }
            match serde_json::from_value::<SectionValue>(value) {
                Ok(section) => data.set(key, section),
                Err(e) => app_log!(warn, "Ignoring malformed section {}: {}", key, e),
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_credentials_join_degree_titles() {
        let r = record(json!({ "Degree Title": ["MD", "MPH"] }));
        assert_eq!(derive_credentials(&r), "MD, MPH");
    }

    #[test]
    fn test_credentials_accept_option_objects() {
        let r = record(json!({
            "Degree Title": [{ "label": "Doctor of Medicine", "value": "MD" }, { "label": "PhD" }]
        }));
        assert_eq!(derive_credentials(&r), "MD, PhD");
    }

    #[test]
    fn test_full_name_skips_empty_middle_name() {
        let r = record(json!({
            "First Name": "Jane", "Middle Name": "", "Last Name": "Doe"
        }));
        assert_eq!(derive_full_name(&r), "Jane Doe");
    }

    #[test]
    fn test_full_name_with_middle_name() {
        let r = record(json!({
            "First Name": " Jane ", "Middle Name": "Q", "Last Name": "Doe"
        }));
        assert_eq!(derive_full_name(&r), "Jane Q Doe");
    }

    #[test]
    fn test_deserialize_drops_unknown_sections_and_shapes_values() {
        let data: AggregatedCvData = serde_json::from_value(json!({
            "Personal Information": [{ "First Name": "Ada" }],
            "Education": { "Institution": "Johns Hopkins" },
            "Hobbies": ["chess"],
            "Languages": null
        }))
        .unwrap();

        assert!(matches!(
            data.get(SectionKey::PersonalInformation),
            Some(SectionValue::Single(_))
        ));
        assert_eq!(data.records(SectionKey::Education).len(), 1);
        assert!(data.get(SectionKey::Languages).is_none());
        assert_eq!(data.sections().count(), 2);
    }

    #[test]
    fn test_serialize_uses_section_names() {
        let mut data = AggregatedCvData::new();
        data.set(
            SectionKey::HonorsAndAwards,
            SectionValue::Repeated(vec![record(json!({ "Title": "Fellow" }))]),
        );
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["Honors & Awards"][0]["Title"], "Fellow");
    }

    #[test]
    fn test_template_is_blank() {
        let template = SectionValue::template(SectionKey::Publications);
        assert_eq!(template.records().len(), 1);
        assert!(template.is_empty());
        assert!(SectionValue::template(SectionKey::PersonalInformation).is_empty());
    }
}
