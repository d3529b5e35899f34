//! Submission Transformer — `ApplicantRecord` → `SubmissionPayload`.
//!
//! Each experience entry keeps its original `startDate`/`endDate` strings and
//! gains numeric `startMonth`, `startYear`, `endMonth`, `endYear`. The phone
//! number loses its keypad spacing. The source record is never modified.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::path::{EntryField, FieldPath};
use crate::form::validation::{normalize_phone, parse_year_month};
use crate::models::applicant::{ApplicantRecord, EducationLevel, ExperienceEntry, Sex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Malformed date '{value}' at {path}")]
    MalformedDate { path: FieldPath, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadDetail {
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayloadExperience {
    pub role: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub details: Vec<PayloadDetail>,
    pub start_month: u32,
    pub start_year: i32,
    pub end_month: u32,
    pub end_year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub sex: Option<Sex>,
    pub birthdate: String,
    pub years_of_experience: Option<u32>,
    pub highest_education_attained: Option<EducationLevel>,
    pub experience: Vec<PayloadExperience>,
}

fn month_year(entry: usize, field: EntryField, raw: &str) -> Result<(u32, i32), SubmissionError> {
    parse_year_month(raw)
        .map(|date| (date.month(), date.year()))
        .ok_or_else(|| SubmissionError::MalformedDate {
            path: FieldPath::entry(entry, field),
            value: raw.to_string(),
        })
}

fn transform_entry(
    index: usize,
    exp: &ExperienceEntry,
) -> Result<PayloadExperience, SubmissionError> {
    let (start_month, start_year) = month_year(index, EntryField::StartDate, &exp.start_date)?;
    let (end_month, end_year) = month_year(index, EntryField::EndDate, &exp.end_date)?;

    Ok(PayloadExperience {
        role: exp.role.clone(),
        company: exp.company.clone(),
        location: exp.location.clone(),
        start_date: exp.start_date.clone(),
        end_date: exp.end_date.clone(),
        details: exp
            .details
            .iter()
            .map(|d| PayloadDetail {
                description: d.description.clone(),
            })
            .collect(),
        start_month,
        start_year,
        end_month,
        end_year,
    })
}

/// Builds the payload for `record`. Fails on the first unparseable date.
pub fn build_payload(record: &ApplicantRecord) -> Result<SubmissionPayload, SubmissionError> {
    let experience = record
        .experience
        .iter()
        .enumerate()
        .map(|(i, exp)| transform_entry(i, exp))
        .collect::<Result<Vec<_>, _>>()?;

    let personal = &record.personal;
    Ok(SubmissionPayload {
        first_name: personal.first_name.clone(),
        last_name: personal.last_name.clone(),
        phone_number: normalize_phone(&personal.phone_number),
        sex: personal.sex,
        birthdate: personal.birthdate.clone(),
        years_of_experience: record.education.years_of_experience,
        highest_education_attained: record.education.highest_education_attained,
        experience,
    })
}
