use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::path::{all_paths, resolve, EntryField, FieldPath, FieldRef, PathError};
use crate::models::applicant::ApplicantRecord;

pub const REQUIRED_MESSAGE: &str = "Please fill out this field";
pub const PHONE_MESSAGE: &str = "Please fill in a valid Phone Number";
pub const BIRTHDATE_MESSAGE: &str = "Please fill in this field";
pub const DATE_MESSAGE: &str = "Please fill in a valid date";

/// Phone length bounds, counted after internal spaces are stripped.
pub const PHONE_MIN_LEN: usize = 10;
pub const PHONE_MAX_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    MissingValue,
    InvalidFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn missing() -> Self {
        Self {
            kind: ErrorKind::MissingValue,
            message: REQUIRED_MESSAGE.to_string(),
        }
    }

    pub fn invalid(message: &str) -> Self {
        Self {
            kind: ErrorKind::InvalidFormat,
            message: message.to_string(),
        }
    }
}

/// Field path → error. Sorted in render order; empty means the form is valid.
pub type FieldErrors = BTreeMap<FieldPath, FieldError>;

/// Removes every space from a keypad-formatted phone number.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| *c != ' ').collect()
}

pub fn parse_birthdate(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parses a month-input value (`2020-03`). Full dates (`2020-03-15`) are
/// accepted as well, since the date parser on the other side takes both.
pub fn parse_year_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Evaluates the rule for one field.
pub fn validate_field(
    record: &ApplicantRecord,
    path: FieldPath,
) -> Result<Option<FieldError>, PathError> {
    let value = resolve(record, path)?;
    Ok(check(path, value))
}

fn check(path: FieldPath, value: FieldRef<'_>) -> Option<FieldError> {
    match (path, value) {
        // Optional free text.
        (
            FieldPath::Experience {
                field: EntryField::Company | EntryField::Location,
                ..
            },
            _,
        ) => None,

        // Optional selection: an unset education level is accepted.
        (FieldPath::HighestEducationAttained, _) => None,

        (_, FieldRef::Sex(None)) | (_, FieldRef::Number(None)) => Some(FieldError::missing()),
        (_, FieldRef::Sex(Some(_))) | (_, FieldRef::Number(Some(_))) => None,
        (_, FieldRef::Education(_)) => None,

        (_, FieldRef::Text(text)) if is_blank(text) => Some(FieldError::missing()),

        (FieldPath::PhoneNumber, FieldRef::Text(text)) => {
            let len = normalize_phone(text).chars().count();
            if (PHONE_MIN_LEN..=PHONE_MAX_LEN).contains(&len) {
                None
            } else {
                Some(FieldError::invalid(PHONE_MESSAGE))
            }
        }
        (FieldPath::Birthdate, FieldRef::Text(text)) => match parse_birthdate(text) {
            Some(_) => None,
            None => Some(FieldError::invalid(BIRTHDATE_MESSAGE)),
        },
        (
            FieldPath::Experience {
                field: EntryField::StartDate | EntryField::EndDate,
                ..
            },
            FieldRef::Text(text),
        ) => match parse_year_month(text) {
            Some(_) => None,
            None => Some(FieldError::invalid(DATE_MESSAGE)),
        },

        (_, FieldRef::Text(_)) => None,
    }
}

/// Evaluates every field of the record.
pub fn validate_record(record: &ApplicantRecord) -> FieldErrors {
    all_paths(record)
        .into_iter()
        .filter_map(|path| {
            // Paths come from the record itself, so resolution cannot fail.
            validate_field(record, path)
                .ok()
                .flatten()
                .map(|error| (path, error))
        })
        .collect()
}

/// The field the rendering layer should focus after a failed submit.
pub fn first_invalid(errors: &FieldErrors) -> Option<FieldPath> {
    errors.keys().next().copied()
}
