// src/document/layout.rs
//! Section-to-entry mapping shared by the HTML preview and the Typst source

use serde_json::Value;

use crate::types::cv_data::{derive_credentials, field_text, AggregatedCvData, Record};
use crate::types::section::{SectionKey, CREDENTIALS};
use crate::wizard::validation::parse_partial_date;

/// One printable line group of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub heading: String,
    pub details: Vec<String>,
    pub period: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub credentials: Option<String>,
    pub specialty: Option<String>,
    pub contact: Vec<String>,
}

struct EntryLayout {
    heading: &'static [&'static str],
    details: &'static [&'static str],
    start: Option<&'static str>,
    end: Option<&'static str>,
    /// End shown as "Present" when blank.
    open_ended: bool,
    description: Option<&'static str>,
}

fn layout_for(key: SectionKey) -> EntryLayout {
    let (heading, details, start, end, open_ended, description): (
        &'static [&'static str],
        &'static [&'static str],
        Option<&'static str>,
        Option<&'static str>,
        bool,
        Option<&'static str>,
    ) = match key {
        SectionKey::PersonalInformation => (&[], &[], None, None, false, None),
        SectionKey::Education => (
            &["Degree", "Field of Study"],
            &["Institution", "City", "Country"],
            Some("Start Date"),
            Some("End Date"),
            false,
            None,
        ),
        SectionKey::PostgraduateTraining => (
            &["Program Type", "Specialty"],
            &["Institution", "Program Director"],
            Some("Start Date"),
            Some("End Date"),
            false,
            None,
        ),
        SectionKey::BoardCertifications => (
            &["Board"],
            &["Specialty"],
            Some("Certification Date"),
            Some("Expiration Date"),
            false,
            None,
        ),
        SectionKey::LicensesAndCertifications => (
            &["License Type"],
            &["State", "License Number"],
            Some("Issue Date"),
            Some("Expiration Date"),
            false,
            None,
        ),
        SectionKey::ProfessionalExperience => (
            &["Position"],
            &["Organization", "City", "Country"],
            Some("Start Date"),
            Some("End Date"),
            true,
            Some("Description"),
        ),
        SectionKey::HospitalAffiliations => (
            &["Hospital"],
            &["Role", "Site"],
            Some("Start Date"),
            Some("End Date"),
            true,
            None,
        ),
        SectionKey::AcademicAppointments => (
            &["Title"],
            &["Institution", "Department"],
            Some("Start Date"),
            Some("End Date"),
            true,
            None,
        ),
        SectionKey::ProfessionalMemberships => (
            &["Organization"],
            &["Role"],
            Some("Member Since"),
            None,
            false,
            None,
        ),
        SectionKey::HonorsAndAwards => (
            &["Title"],
            &["Awarding Body"],
            Some("Year"),
            None,
            false,
            Some("Description"),
        ),
        SectionKey::Publications => (
            &["Title"],
            &["Authors", "Journal", "DOI"],
            Some("Year"),
            None,
            false,
            None,
        ),
        SectionKey::Presentations => (
            &["Title"],
            &["Event", "Location"],
            Some("Date"),
            None,
            false,
            None,
        ),
        SectionKey::Languages => (&["Language"], &["Proficiency"], None, None, false, None),
    };

    EntryLayout {
        heading,
        details,
        start,
        end,
        open_ended,
        description,
    }
}

fn join_fields(record: &Record, fields: &[&str], separator: &str) -> String {
    fields
        .iter()
        .filter_map(|f| field_text(record, f))
        .collect::<Vec<_>>()
        .join(separator)
}

/// "2008-09" and "2008-09-01" read as "Sep 2008"; anything else is kept.
pub fn format_date(text: &str) -> String {
    parse_partial_date(text)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| text.to_string())
}

fn is_flag_set(record: &Record, field: &str) -> bool {
    matches!(record.get(field), Some(Value::Bool(true)))
}

fn period(record: &Record, layout: &EntryLayout, key: SectionKey) -> Option<String> {
    let start = layout
        .start
        .and_then(|f| field_text(record, f))
        .map(format_date);

    let end = match layout.end.and_then(|f| field_text(record, f)) {
        Some(end) => Some(format_date(end)),
        None if key == SectionKey::BoardCertifications && is_flag_set(record, "Lifetime") => {
            Some("Lifetime".to_string())
        }
        None if layout.open_ended && start.is_some() => Some("Present".to_string()),
        None => None,
    };

    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{} - {}", start, end)),
        (Some(start), None) if key == SectionKey::ProfessionalMemberships => {
            Some(format!("Since {}", start))
        }
        (Some(start), None) => Some(start),
        (None, Some(end)) => Some(end),
        (None, None) => None,
    }
}

fn entry(key: SectionKey, record: &Record) -> Option<Entry> {
    let layout = layout_for(key);
    let heading = join_fields(record, layout.heading, ", ");
    let details: Vec<String> = layout
        .details
        .iter()
        .filter_map(|f| field_text(record, f).map(|value| (*f, value)))
        .map(|(field, value)| match detail_label(field) {
            Some(label) => format!("{} {}", label, value),
            None => value.to_string(),
        })
        .collect();
    let period = period(record, &layout, key);
    let description = layout
        .description
        .and_then(|f| field_text(record, f))
        .map(str::to_string);

    if heading.is_empty() && details.is_empty() && period.is_none() && description.is_none() {
        return None;
    }

    Some(Entry {
        heading,
        details,
        period,
        description,
    })
}

fn detail_label(field: &str) -> Option<&'static str> {
    match field {
        "License Number" => Some("No."),
        "DOI" => Some("doi:"),
        _ => None,
    }
}

/// Printable entries of a section, blank records skipped.
pub fn section_entries(data: &AggregatedCvData, key: SectionKey) -> Vec<Entry> {
    data.records(key)
        .iter()
        .filter_map(|record| entry(key, record))
        .collect()
}

/// Sections to print, in wizard order, Personal Information excluded.
pub fn printable_sections(data: &AggregatedCvData) -> Vec<(SectionKey, Vec<Entry>)> {
    SectionKey::ALL
        .iter()
        .copied()
        .filter(|k| *k != SectionKey::PersonalInformation)
        .map(|k| (k, section_entries(data, k)))
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
}

pub fn header(data: &AggregatedCvData) -> Option<Header> {
    let record = data.personal_information()?;
    let name = data.full_name()?;
    let credentials = field_text(record, CREDENTIALS)
        .map(str::to_string)
        .or_else(|| {
            let derived = derive_credentials(record);
            (!derived.is_empty()).then_some(derived)
        });

    let location = join_fields(record, &["City", "State", "Country"], ", ");
    let contact = ["Email", "Phone"]
        .iter()
        .filter_map(|f| field_text(record, f).map(str::to_string))
        .chain((!location.is_empty()).then_some(location))
        .collect();

    Some(Header {
        name,
        credentials,
        specialty: field_text(record, "Primary Specialty").map(str::to_string),
        contact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::SectionValue;
    use serde_json::json;

    fn repeated(values: Vec<Value>) -> SectionValue {
        SectionValue::Repeated(
            values
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2012-06"), "Jun 2012");
        assert_eq!(format_date("2012-06-15"), "Jun 2012");
        assert_eq!(format_date("2012"), "2012");
    }

    #[test]
    fn test_open_ended_experience_reads_present() {
        let mut data = AggregatedCvData::new();
        data.set(
            SectionKey::ProfessionalExperience,
            repeated(vec![json!({
                "Organization": "Mercy General",
                "Position": "Attending Physician",
                "City": "Sacramento",
                "Start Date": "2019-07",
                "End Date": ""
            })]),
        );
        let entries = section_entries(&data, SectionKey::ProfessionalExperience);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].heading, "Attending Physician");
        assert_eq!(entries[0].details, vec!["Mercy General", "Sacramento"]);
        assert_eq!(entries[0].period.as_deref(), Some("Jul 2019 - Present"));
    }

    #[test]
    fn test_blank_records_and_sections_are_skipped() {
        let mut data = AggregatedCvData::new();
        data.set(
            SectionKey::Publications,
            SectionValue::template(SectionKey::Publications),
        );
        data.set(
            SectionKey::LicensesAndCertifications,
            repeated(vec![json!({
                "License Type": "Medical License",
                "License Number": "A12345",
                "State": "CA"
            })]),
        );
        let sections = printable_sections(&data);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, SectionKey::LicensesAndCertifications);
        assert_eq!(sections[0].1[0].details, vec!["CA", "No. A12345"]);
    }

    #[test]
    fn test_header_uses_derived_fields() {
        let mut data = AggregatedCvData::new();
        data.set(
            SectionKey::PersonalInformation,
            SectionValue::Single(
                json!({
                    "First Name": "Jane",
                    "Last Name": "Doe",
                    "Degree Title": ["MD", "MPH"],
                    "Email": "jane@example.org",
                    "City": "Boston",
                    "State": "MA"
                })
                .as_object()
                .cloned()
                .unwrap(),
            ),
        );
        let header = header(&data).unwrap();
        assert_eq!(header.name, "Jane Doe");
        assert_eq!(header.credentials.as_deref(), Some("MD, MPH"));
        assert_eq!(header.contact, vec!["jane@example.org", "Boston, MA"]);
        assert!(header.specialty.is_none());
    }
}
