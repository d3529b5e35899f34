//! Form State Controller — sole owner of one applicant record.
//!
//! Every mutation goes through here: field setters re-check the touched path,
//! list operations delegate to the array manager and keep the positional error
//! mapping in step, and `submit` runs the full validation pass before handing
//! the record to the transformer.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::array::{self, ListChange};
use super::path::{resolve, resolve_text_mut, FieldKind, FieldPath, FieldRef, ListPath, PathError};
use super::validation::{
    first_invalid, validate_field, validate_record, FieldError, FieldErrors, DATE_MESSAGE,
};
use crate::models::applicant::{
    ApplicantRecord, DescriptionItem, EducationLevel, ExperienceEntry, Sex,
};
use crate::submission::{build_payload, SubmissionError, SubmissionPayload};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Editing,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("'{0}' is a selection field and cannot be set from text")]
    ControlledField(FieldPath),

    #[error("'{raw}' is not a valid number for '{path}'")]
    NotANumber { path: FieldPath, raw: String },

    #[error("Form has already been submitted")]
    AlreadySubmitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .errors.len())]
    Invalid {
        errors: FieldErrors,
        first_invalid: FieldPath,
    },

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Form(#[from] FormError),
}

/// Owned copy of a field value, as handed to the binding layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Option<u32>),
    Sex(Option<Sex>),
    Education(Option<EducationLevel>),
}

impl From<FieldRef<'_>> for FieldValue {
    fn from(value: FieldRef<'_>) -> Self {
        match value {
            FieldRef::Text(text) => FieldValue::Text(text.to_string()),
            FieldRef::Number(n) => FieldValue::Number(n),
            FieldRef::Sex(sex) => FieldValue::Sex(sex),
            FieldRef::Education(level) => FieldValue::Education(level),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormController {
    record: ApplicantRecord,
    errors: FieldErrors,
    status: FormStatus,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        Self {
            record: ApplicantRecord::new(),
            errors: FieldErrors::new(),
            status: FormStatus::Editing,
        }
    }

    pub fn record(&self) -> &ApplicantRecord {
        &self.record
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn value(&self, path: FieldPath) -> Result<FieldValue, FormError> {
        Ok(resolve(&self.record, path)?.into())
    }

    pub fn error(&self, path: FieldPath) -> Option<&FieldError> {
        self.errors.get(&path)
    }

    fn ensure_editing(&self) -> Result<(), FormError> {
        match self.status {
            FormStatus::Editing => Ok(()),
            FormStatus::Submitted => Err(FormError::AlreadySubmitted),
        }
    }

    /// Local re-check of one path after its value changed.
    fn recheck(&mut self, path: FieldPath) -> Result<Option<&FieldError>, FormError> {
        match validate_field(&self.record, path)? {
            Some(error) => {
                self.errors.insert(path, error);
            }
            None => {
                self.errors.remove(&path);
            }
        }
        Ok(self.errors.get(&path))
    }

    // ────────────────────────────────────────────────────────────────────────
    // Field setters
    // ────────────────────────────────────────────────────────────────────────

    /// Change event from a registered (free-text or numeric) input.
    pub fn set_text(
        &mut self,
        path: FieldPath,
        raw: &str,
    ) -> Result<Option<&FieldError>, FormError> {
        self.ensure_editing()?;
        match path.kind() {
            FieldKind::Controlled => return Err(FormError::ControlledField(path)),
            FieldKind::Number => {
                let years = parse_count(raw).ok_or_else(|| FormError::NotANumber {
                    path,
                    raw: raw.to_string(),
                })?;
                self.record.education.years_of_experience = years;
            }
            FieldKind::Text => {
                if let Some(text) = resolve_text_mut(&mut self.record, path)? {
                    *text = raw.to_string();
                }
            }
        }
        self.recheck(path)
    }

    pub fn set_years(&mut self, years: Option<u32>) -> Result<Option<&FieldError>, FormError> {
        self.ensure_editing()?;
        self.record.education.years_of_experience = years;
        self.recheck(FieldPath::YearsOfExperience)
    }

    pub fn set_sex(&mut self, sex: Option<Sex>) -> Result<Option<&FieldError>, FormError> {
        self.ensure_editing()?;
        self.record.personal.sex = sex;
        self.recheck(FieldPath::Sex)
    }

    pub fn set_education(
        &mut self,
        level: Option<EducationLevel>,
    ) -> Result<Option<&FieldError>, FormError> {
        self.ensure_editing()?;
        self.record.education.highest_education_attained = level;
        self.recheck(FieldPath::HighestEducationAttained)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Lists
    // ────────────────────────────────────────────────────────────────────────

    pub fn list_len(&self, list: ListPath) -> Result<usize, FormError> {
        Ok(super::path::list_len(&self.record, list)?)
    }

    /// Stable per-item identities, in display order.
    pub fn item_ids(&self, list: ListPath) -> Result<Vec<Uuid>, FormError> {
        let ids = match list {
            ListPath::Experience => self.record.experience.iter().map(|e| e.id).collect(),
            ListPath::Details { entry } => self
                .entry(entry)?
                .details
                .iter()
                .map(|d| d.id)
                .collect(),
        };
        Ok(ids)
    }

    fn entry(&self, entry: usize) -> Result<&ExperienceEntry, PathError> {
        self.record
            .experience
            .get(entry)
            .ok_or(PathError::OutOfRange {
                list: ListPath::Experience,
                index: entry,
                len: self.record.experience.len(),
            })
    }

    fn entry_mut(&mut self, entry: usize) -> Result<&mut ExperienceEntry, PathError> {
        let len = self.record.experience.len();
        self.record
            .experience
            .get_mut(entry)
            .ok_or(PathError::OutOfRange {
                list: ListPath::Experience,
                index: entry,
                len,
            })
    }

    /// Appends a blank item to `list`. Appending never triggers validation.
    pub fn append(&mut self, list: ListPath) -> Result<ListChange, FormError> {
        self.ensure_editing()?;
        let change = match list {
            ListPath::Experience => {
                array::append(&mut self.record.experience, ExperienceEntry::blank())
            }
            ListPath::Details { entry } => {
                array::append(&mut self.entry_mut(entry)?.details, DescriptionItem::blank())
            }
        };
        debug!(%list, ?change, "List item appended");
        Ok(change)
    }

    /// Removes `index` from `list`; a sole remaining item stays put.
    pub fn remove(&mut self, list: ListPath, index: usize) -> Result<ListChange, FormError> {
        self.ensure_editing()?;
        let change = match list {
            ListPath::Experience => array::remove(list, &mut self.record.experience, index)?,
            ListPath::Details { entry } => {
                array::remove(list, &mut self.entry_mut(entry)?.details, index)?
            }
        };

        if let ListChange::Removed { index } = change {
            let errors = std::mem::take(&mut self.errors);
            self.errors = array::reindex_after_remove(errors, list, index);
            self.revalidate_list(list);
            debug!(%list, index, "List item removed");
        } else {
            debug!(%list, index, "Removal of the last item ignored");
        }
        Ok(change)
    }

    /// Re-runs the rule for every error still keyed under `list`.
    fn revalidate_list(&mut self, list: ListPath) {
        let keyed: Vec<FieldPath> = self
            .errors
            .keys()
            .filter(|path| path.index_in(list).is_some())
            .copied()
            .collect();
        for path in keyed {
            match validate_field(&self.record, path) {
                Ok(Some(error)) => {
                    self.errors.insert(path, error);
                }
                Ok(None) | Err(_) => {
                    self.errors.remove(&path);
                }
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Submit
    // ────────────────────────────────────────────────────────────────────────

    /// Full validation, then payload derivation. Only a clean record with
    /// parseable dates moves the form to `Submitted`.
    pub fn submit(&mut self) -> Result<SubmissionPayload, SubmitError> {
        self.ensure_editing()?;

        self.errors = validate_record(&self.record);
        if let Some(first) = first_invalid(&self.errors) {
            info!(
                invalid = self.errors.len(),
                first_invalid = %first,
                "Submit blocked by validation"
            );
            return Err(SubmitError::Invalid {
                errors: self.errors.clone(),
                first_invalid: first,
            });
        }

        match build_payload(&self.record) {
            Ok(payload) => {
                self.status = FormStatus::Submitted;
                info!(entries = payload.experience.len(), "Applicant form submitted");
                Ok(payload)
            }
            Err(err) => {
                let SubmissionError::MalformedDate { path, .. } = &err;
                self.errors.insert(*path, FieldError::invalid(DATE_MESSAGE));
                info!(error = %err, "Submit blocked by malformed date");
                Err(err.into())
            }
        }
    }

    /// Returns a submitted form to editing after its payload could not be
    /// delivered. The record and error map are left as they were.
    pub fn reopen(&mut self) {
        if self.status == FormStatus::Submitted {
            self.status = FormStatus::Editing;
            info!("Applicant form reopened after failed delivery");
        }
    }
}

#[cfg(test)]
impl FormController {
    pub fn append_experience(&mut self) -> Result<ListChange, FormError> {
        self.append(ListPath::Experience)
    }

    pub fn remove_experience(&mut self, index: usize) -> Result<ListChange, FormError> {
        self.remove(ListPath::Experience, index)
    }

    pub fn append_detail(&mut self, entry: usize) -> Result<ListChange, FormError> {
        self.append(ListPath::Details { entry })
    }

    pub fn remove_detail(&mut self, entry: usize, item: usize) -> Result<ListChange, FormError> {
        self.remove(ListPath::Details { entry }, item)
    }
}

/// Numeric input coercion: blank clears, digits parse, anything else is rejected.
fn parse_count(raw: &str) -> Option<Option<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    raw.parse::<u32>().ok().map(Some)
}
