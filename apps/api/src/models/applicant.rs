use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    M,
    F,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    Primary,
    Junior,
    Senior,
    Undergraduate,
    Graduate,
    Doctoral,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 6] = [
        EducationLevel::Primary,
        EducationLevel::Junior,
        EducationLevel::Senior,
        EducationLevel::Undergraduate,
        EducationLevel::Graduate,
        EducationLevel::Doctoral,
    ];

    /// Display label shown by the select control.
    pub fn label(&self) -> &'static str {
        match self {
            EducationLevel::Primary => "Primary",
            EducationLevel::Junior => "Junior High School",
            EducationLevel::Senior => "Senior High School",
            EducationLevel::Undergraduate => "Undergraduate",
            EducationLevel::Graduate => "Graduate",
            EducationLevel::Doctoral => "Doctoral",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    /// Raw keypad-formatted input, e.g. `922 283 3416`.
    pub phone_number: String,
    pub sex: Option<Sex>,
    /// ISO date string as typed into the date input.
    pub birthdate: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EducationDetails {
    pub highest_education_attained: Option<EducationLevel>,
    pub years_of_experience: Option<u32>,
}

/// One bullet of impact/description text under an experience entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DescriptionItem {
    pub id: Uuid,
    pub description: String,
}

impl DescriptionItem {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: String::new(),
        }
    }
}

/// One employment episode. `start_date`/`end_date` hold year-month strings (`2020-03`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub role: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub details: Vec<DescriptionItem>,
}

impl ExperienceEntry {
    /// A fresh entry always starts with one empty description item.
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: String::new(),
            company: String::new(),
            location: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            details: vec![DescriptionItem::blank()],
        }
    }
}

/// Root of the form state. Serialized flat, the way the form registers its fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRecord {
    #[serde(flatten)]
    pub personal: PersonalDetails,
    #[serde(flatten)]
    pub education: EducationDetails,
    pub experience: Vec<ExperienceEntry>,
}

impl ApplicantRecord {
    /// The minimal legal instance: one entry holding one empty description.
    pub fn new() -> Self {
        Self {
            personal: PersonalDetails::default(),
            education: EducationDetails::default(),
            experience: vec![ExperienceEntry::blank()],
        }
    }
}

impl Default for ApplicantRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_minimal_legal_instance() {
        let record = ApplicantRecord::new();
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].details.len(), 1);
        assert!(record.experience[0].details[0].description.is_empty());
        assert_eq!(record.personal.sex, None);
        assert_eq!(record.education.years_of_experience, None);
    }

    #[test]
    fn test_record_serializes_flat_camel_case() {
        let mut record = ApplicantRecord::new();
        record.personal.first_name = "Juan".to_string();
        record.education.highest_education_attained = Some(EducationLevel::Undergraduate);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["firstName"], "Juan");
        assert_eq!(json["highestEducationAttained"], "undergraduate");
        assert!(json["experience"][0]["startDate"].is_string());
        assert!(json.get("personal").is_none());
    }

    #[test]
    fn test_sex_wire_values() {
        assert_eq!(serde_json::to_value(Sex::M).unwrap(), "M");
        let f: Sex = serde_json::from_value(serde_json::json!("F")).unwrap();
        assert_eq!(f, Sex::F);
    }

    #[test]
    fn test_blank_entries_get_distinct_ids() {
        let a = ExperienceEntry::blank();
        let b = ExperienceEntry::blank();
        assert_ne!(a.id, b.id);
        assert_ne!(a.details[0].id, b.details[0].id);
    }
}
