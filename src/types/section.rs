// src/types/section.rs
//! The fixed set of CV sections and the fields each one carries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the 13 CV sections, in wizard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionKey {
    #[serde(rename = "Personal Information")]
    PersonalInformation,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Postgraduate Training")]
    PostgraduateTraining,
    #[serde(rename = "Board Certifications")]
    BoardCertifications,
    #[serde(rename = "Licenses & Certifications")]
    LicensesAndCertifications,
    #[serde(rename = "Professional Experience")]
    ProfessionalExperience,
    #[serde(rename = "Hospital Affiliations")]
    HospitalAffiliations,
    #[serde(rename = "Academic Appointments")]
    AcademicAppointments,
    #[serde(rename = "Professional Memberships")]
    ProfessionalMemberships,
    #[serde(rename = "Honors & Awards")]
    HonorsAndAwards,
    #[serde(rename = "Publications")]
    Publications,
    #[serde(rename = "Presentations")]
    Presentations,
    #[serde(rename = "Languages")]
    Languages,
}

impl SectionKey {
    pub const ALL: [SectionKey; 13] = [
        SectionKey::PersonalInformation,
        SectionKey::Education,
        SectionKey::PostgraduateTraining,
        SectionKey::BoardCertifications,
        SectionKey::LicensesAndCertifications,
        SectionKey::ProfessionalExperience,
        SectionKey::HospitalAffiliations,
        SectionKey::AcademicAppointments,
        SectionKey::ProfessionalMemberships,
        SectionKey::HonorsAndAwards,
        SectionKey::Publications,
        SectionKey::Presentations,
        SectionKey::Languages,
    ];

    /// Display name, also used as the key in the aggregated CV JSON.
    pub fn name(self) -> &'static str {
        match self {
            SectionKey::PersonalInformation => "Personal Information",
            SectionKey::Education => "Education",
            SectionKey::PostgraduateTraining => "Postgraduate Training",
            SectionKey::BoardCertifications => "Board Certifications",
            SectionKey::LicensesAndCertifications => "Licenses & Certifications",
            SectionKey::ProfessionalExperience => "Professional Experience",
            SectionKey::HospitalAffiliations => "Hospital Affiliations",
            SectionKey::AcademicAppointments => "Academic Appointments",
            SectionKey::ProfessionalMemberships => "Professional Memberships",
            SectionKey::HonorsAndAwards => "Honors & Awards",
            SectionKey::Publications => "Publications",
            SectionKey::Presentations => "Presentations",
            SectionKey::Languages => "Languages",
        }
    }

    /// Wizard position, starting at 1.
    pub fn position(self) -> u32 {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }

    pub fn from_position(position: u32) -> Option<Self> {
        position
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    /// Personal Information is a single record, everything else a list.
    pub fn is_repeatable(self) -> bool {
        !matches!(self, SectionKey::PersonalInformation)
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            SectionKey::PersonalInformation => PERSONAL_INFORMATION_FIELDS,
            SectionKey::Education => EDUCATION_FIELDS,
            SectionKey::PostgraduateTraining => POSTGRADUATE_TRAINING_FIELDS,
            SectionKey::BoardCertifications => BOARD_CERTIFICATION_FIELDS,
            SectionKey::LicensesAndCertifications => LICENSE_FIELDS,
            SectionKey::ProfessionalExperience => EXPERIENCE_FIELDS,
            SectionKey::HospitalAffiliations => AFFILIATION_FIELDS,
            SectionKey::AcademicAppointments => APPOINTMENT_FIELDS,
            SectionKey::ProfessionalMemberships => MEMBERSHIP_FIELDS,
            SectionKey::HonorsAndAwards => AWARD_FIELDS,
            SectionKey::Publications => PUBLICATION_FIELDS,
            SectionKey::Presentations => PRESENTATION_FIELDS,
            SectionKey::Languages => LANGUAGE_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Start/end field pair whose ordering is checked on submit.
    pub fn date_range(self) -> Option<(&'static str, &'static str)> {
        match self {
            SectionKey::Education
            | SectionKey::PostgraduateTraining
            | SectionKey::ProfessionalExperience
            | SectionKey::HospitalAffiliations
            | SectionKey::AcademicAppointments => Some(("Start Date", "End Date")),
            SectionKey::LicensesAndCertifications => Some(("Issue Date", "Expiration Date")),
            SectionKey::BoardCertifications => Some(("Certification Date", "Expiration Date")),
            _ => None,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SectionKey {
    type Err = String;

    /// Accepts the display name (case-insensitive) or the 1-based position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(position) = trimmed.parse::<u32>() {
            return Self::from_position(position)
                .ok_or_else(|| format!("No section at position {}", position));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown section: {}", trimmed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    /// Multi-select, stored as a list of strings.
    MultiSelect,
    Email,
    /// `YYYY-MM` or `YYYY-MM-DD`.
    Date,
    Year,
    Flag,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

pub const FIRST_NAME: &str = "First Name";
pub const MIDDLE_NAME: &str = "Middle Name";
pub const LAST_NAME: &str = "Last Name";
pub const DEGREE_TITLE: &str = "Degree Title";
pub const CREDENTIALS: &str = "Credentials";
pub const FULL_NAME: &str = "Full Name";

static PERSONAL_INFORMATION_FIELDS: &[FieldSpec] = &[
    required(FIRST_NAME, FieldKind::Text),
    optional(MIDDLE_NAME, FieldKind::Text),
    required(LAST_NAME, FieldKind::Text),
    required(DEGREE_TITLE, FieldKind::MultiSelect),
    required("Email", FieldKind::Email),
    optional("Phone", FieldKind::Text),
    optional("Address", FieldKind::Text),
    optional("City", FieldKind::Text),
    optional("State", FieldKind::Text),
    optional("Country", FieldKind::Text),
    optional("Zip Code", FieldKind::Text),
    required("Primary Specialty", FieldKind::Text),
    optional("Site", FieldKind::Text),
];

static EDUCATION_FIELDS: &[FieldSpec] = &[
    required("Institution", FieldKind::Text),
    required("Degree", FieldKind::Text),
    optional("Field of Study", FieldKind::Text),
    optional("City", FieldKind::Text),
    optional("Country", FieldKind::Text),
    required("Start Date", FieldKind::Date),
    optional("End Date", FieldKind::Date),
];

static POSTGRADUATE_TRAINING_FIELDS: &[FieldSpec] = &[
    required("Program Type", FieldKind::Text),
    required("Institution", FieldKind::Text),
    required("Specialty", FieldKind::Text),
    optional("Program Director", FieldKind::Text),
    required("Start Date", FieldKind::Date),
    optional("End Date", FieldKind::Date),
];

static BOARD_CERTIFICATION_FIELDS: &[FieldSpec] = &[
    required("Board", FieldKind::Text),
    required("Specialty", FieldKind::Text),
    required("Certification Date", FieldKind::Date),
    optional("Expiration Date", FieldKind::Date),
    optional("Lifetime", FieldKind::Flag),
];

static LICENSE_FIELDS: &[FieldSpec] = &[
    required("License Type", FieldKind::Text),
    required("License Number", FieldKind::Text),
    required("State", FieldKind::Text),
    optional("Issue Date", FieldKind::Date),
    optional("Expiration Date", FieldKind::Date),
];

static EXPERIENCE_FIELDS: &[FieldSpec] = &[
    required("Organization", FieldKind::Text),
    required("Position", FieldKind::Text),
    optional("City", FieldKind::Text),
    optional("Country", FieldKind::Text),
    required("Start Date", FieldKind::Date),
    optional("End Date", FieldKind::Date),
    optional("Current", FieldKind::Flag),
    optional("Description", FieldKind::Text),
];

static AFFILIATION_FIELDS: &[FieldSpec] = &[
    required("Hospital", FieldKind::Text),
    required("Role", FieldKind::Text),
    optional("Site", FieldKind::Text),
    required("Start Date", FieldKind::Date),
    optional("End Date", FieldKind::Date),
];

static APPOINTMENT_FIELDS: &[FieldSpec] = &[
    required("Institution", FieldKind::Text),
    required("Title", FieldKind::Text),
    optional("Department", FieldKind::Text),
    required("Start Date", FieldKind::Date),
    optional("End Date", FieldKind::Date),
];

static MEMBERSHIP_FIELDS: &[FieldSpec] = &[
    required("Organization", FieldKind::Text),
    optional("Role", FieldKind::Text),
    optional("Member Since", FieldKind::Year),
];

static AWARD_FIELDS: &[FieldSpec] = &[
    required("Title", FieldKind::Text),
    required("Awarding Body", FieldKind::Text),
    optional("Year", FieldKind::Year),
    optional("Description", FieldKind::Text),
];

static PUBLICATION_FIELDS: &[FieldSpec] = &[
    required("Title", FieldKind::Text),
    required("Authors", FieldKind::Text),
    optional("Journal", FieldKind::Text),
    required("Year", FieldKind::Year),
    optional("DOI", FieldKind::Text),
    optional("URL", FieldKind::Text),
];

static PRESENTATION_FIELDS: &[FieldSpec] = &[
    required("Title", FieldKind::Text),
    required("Event", FieldKind::Text),
    optional("Location", FieldKind::Text),
    required("Date", FieldKind::Date),
];

static LANGUAGE_FIELDS: &[FieldSpec] = &[
    required("Language", FieldKind::Text),
    required("Proficiency", FieldKind::Text),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_wizard_order() {
        assert_eq!(SectionKey::PersonalInformation.position(), 1);
        assert_eq!(SectionKey::Languages.position(), 13);
        assert_eq!(SectionKey::from_position(2), Some(SectionKey::Education));
        assert_eq!(SectionKey::from_position(0), None);
        assert_eq!(SectionKey::from_position(14), None);
    }

    #[test]
    fn test_parse_by_name_or_position() {
        assert_eq!(
            "honors & awards".parse::<SectionKey>(),
            Ok(SectionKey::HonorsAndAwards)
        );
        assert_eq!("11".parse::<SectionKey>(), Ok(SectionKey::Publications));
        assert!("Hobbies".parse::<SectionKey>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&SectionKey::LicensesAndCertifications).unwrap();
        assert_eq!(json, "\"Licenses & Certifications\"");
    }

    #[test]
    fn test_every_section_has_a_required_field() {
        for key in SectionKey::ALL {
            assert!(key.fields().iter().any(|f| f.required), "{}", key);
        }
    }
}
