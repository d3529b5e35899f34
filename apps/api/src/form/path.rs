//! Field Path Resolver — maps logical addresses onto the applicant record tree.
//!
//! Paths use the dotted names the form registers its inputs under
//! (`experience.0.details.1.description`). The derived ordering follows render
//! order, so the first path of a sorted error mapping is the one to focus.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::models::applicant::{ApplicantRecord, EducationLevel, Sex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Unknown field path '{0}'")]
    Unknown(String),

    #[error("Index {index} is out of range for '{list}' (length {len})")]
    OutOfRange {
        list: ListPath,
        index: usize,
        len: usize,
    },
}

/// A field inside one experience entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryField {
    Role,
    Company,
    StartDate,
    EndDate,
    Location,
    Description { item: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    FirstName,
    LastName,
    PhoneNumber,
    Sex,
    Birthdate,
    HighestEducationAttained,
    YearsOfExperience,
    Experience { entry: usize, field: EntryField },
}

/// Address of a list-shaped slice of form state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListPath {
    Experience,
    Details { entry: usize },
}

/// How a field's value reaches the form state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Registered input: display and value are the same text.
    Text,
    /// Registered numeric input, coerced from text.
    Number,
    /// Controlled select/radio: the form state is authoritative.
    Controlled,
}

/// Borrowed view of one resolved field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Number(Option<u32>),
    Sex(Option<Sex>),
    Education(Option<EducationLevel>),
}

impl EntryField {
    fn name(&self) -> &'static str {
        match self {
            EntryField::Role => "role",
            EntryField::Company => "company",
            EntryField::StartDate => "startDate",
            EntryField::EndDate => "endDate",
            EntryField::Location => "location",
            EntryField::Description { .. } => "description",
        }
    }
}

impl FieldPath {
    pub fn entry(entry: usize, field: EntryField) -> Self {
        FieldPath::Experience { entry, field }
    }

    pub fn description(entry: usize, item: usize) -> Self {
        FieldPath::Experience {
            entry,
            field: EntryField::Description { item },
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldPath::Sex | FieldPath::HighestEducationAttained => FieldKind::Controlled,
            FieldPath::YearsOfExperience => FieldKind::Number,
            _ => FieldKind::Text,
        }
    }

    /// Position of this path within `list`, if the path lives under it.
    pub fn index_in(&self, list: ListPath) -> Option<usize> {
        match (list, self) {
            (ListPath::Experience, FieldPath::Experience { entry, .. }) => Some(*entry),
            (
                ListPath::Details { entry: owner },
                FieldPath::Experience {
                    entry,
                    field: EntryField::Description { item },
                },
            ) if owner == *entry => Some(*item),
            _ => None,
        }
    }

    /// The same path with its position under `list` replaced by `index`.
    /// Paths outside `list` are returned unchanged.
    pub fn with_index_in(self, list: ListPath, index: usize) -> Self {
        if self.index_in(list).is_none() {
            return self;
        }
        match (list, self) {
            (ListPath::Experience, FieldPath::Experience { field, .. }) => {
                FieldPath::Experience {
                    entry: index,
                    field,
                }
            }
            (ListPath::Details { entry }, FieldPath::Experience { .. }) => {
                FieldPath::description(entry, index)
            }
            (_, other) => other,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::FirstName => f.write_str("firstName"),
            FieldPath::LastName => f.write_str("lastName"),
            FieldPath::PhoneNumber => f.write_str("phoneNumber"),
            FieldPath::Sex => f.write_str("sex"),
            FieldPath::Birthdate => f.write_str("birthdate"),
            FieldPath::HighestEducationAttained => f.write_str("highestEducationAttained"),
            FieldPath::YearsOfExperience => f.write_str("yearsOfExperience"),
            FieldPath::Experience {
                entry,
                field: EntryField::Description { item },
            } => write!(f, "experience.{entry}.details.{item}.description"),
            FieldPath::Experience { entry, field } => {
                write!(f, "experience.{entry}.{}", field.name())
            }
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || PathError::Unknown(s.to_string());
        let parts: Vec<&str> = s.split('.').collect();

        let path = match parts.as_slice() {
            ["firstName"] => FieldPath::FirstName,
            ["lastName"] => FieldPath::LastName,
            ["phoneNumber"] => FieldPath::PhoneNumber,
            ["sex"] => FieldPath::Sex,
            ["birthdate"] => FieldPath::Birthdate,
            ["highestEducationAttained"] => FieldPath::HighestEducationAttained,
            ["yearsOfExperience"] => FieldPath::YearsOfExperience,
            ["experience", entry, name] => {
                let entry = parse_index(entry).ok_or_else(unknown)?;
                let field = match *name {
                    "role" => EntryField::Role,
                    "company" => EntryField::Company,
                    "startDate" => EntryField::StartDate,
                    "endDate" => EntryField::EndDate,
                    "location" => EntryField::Location,
                    _ => return Err(unknown()),
                };
                FieldPath::Experience { entry, field }
            }
            ["experience", entry, "details", item, "description"] => {
                let entry = parse_index(entry).ok_or_else(unknown)?;
                let item = parse_index(item).ok_or_else(unknown)?;
                FieldPath::description(entry, item)
            }
            _ => return Err(unknown()),
        };
        Ok(path)
    }
}

impl fmt::Display for ListPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListPath::Experience => f.write_str("experience"),
            ListPath::Details { entry } => write!(f, "experience.{entry}.details"),
        }
    }
}

impl FromStr for ListPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            ["experience"] => Ok(ListPath::Experience),
            ["experience", entry, "details"] => parse_index(entry)
                .map(|entry| ListPath::Details { entry })
                .ok_or_else(|| PathError::Unknown(s.to_string())),
            _ => Err(PathError::Unknown(s.to_string())),
        }
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    // `usize::from_str` accepts a leading '+', which is not a path segment.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

macro_rules! string_serde {
    ($ty:ty, $expecting:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(|_| {
                    de::Error::invalid_value(de::Unexpected::Str(&raw), &$expecting)
                })
            }
        }
    };
}

string_serde!(FieldPath, "a form field path");
string_serde!(ListPath, "a form list path");

// ────────────────────────────────────────────────────────────────────────────
// Resolution against a record
// ────────────────────────────────────────────────────────────────────────────

fn check_index(list: ListPath, index: usize, len: usize) -> Result<(), PathError> {
    if index < len {
        Ok(())
    } else {
        Err(PathError::OutOfRange { list, index, len })
    }
}

/// Number of items currently held by `list`.
pub fn list_len(record: &ApplicantRecord, list: ListPath) -> Result<usize, PathError> {
    match list {
        ListPath::Experience => Ok(record.experience.len()),
        ListPath::Details { entry } => {
            check_index(ListPath::Experience, entry, record.experience.len())?;
            Ok(record.experience[entry].details.len())
        }
    }
}

/// Reads the value stored at `path`.
pub fn resolve(record: &ApplicantRecord, path: FieldPath) -> Result<FieldRef<'_>, PathError> {
    let personal = &record.personal;
    let value = match path {
        FieldPath::FirstName => FieldRef::Text(&personal.first_name),
        FieldPath::LastName => FieldRef::Text(&personal.last_name),
        FieldPath::PhoneNumber => FieldRef::Text(&personal.phone_number),
        FieldPath::Sex => FieldRef::Sex(personal.sex),
        FieldPath::Birthdate => FieldRef::Text(&personal.birthdate),
        FieldPath::HighestEducationAttained => {
            FieldRef::Education(record.education.highest_education_attained)
        }
        FieldPath::YearsOfExperience => FieldRef::Number(record.education.years_of_experience),
        FieldPath::Experience { entry, field } => {
            check_index(ListPath::Experience, entry, record.experience.len())?;
            let exp = &record.experience[entry];
            match field {
                EntryField::Role => FieldRef::Text(&exp.role),
                EntryField::Company => FieldRef::Text(&exp.company),
                EntryField::Location => FieldRef::Text(&exp.location),
                EntryField::StartDate => FieldRef::Text(&exp.start_date),
                EntryField::EndDate => FieldRef::Text(&exp.end_date),
                EntryField::Description { item } => {
                    check_index(ListPath::Details { entry }, item, exp.details.len())?;
                    FieldRef::Text(&exp.details[item].description)
                }
            }
        }
    };
    Ok(value)
}

/// Mutable access to a free-text field. `None` for numeric and controlled paths.
pub fn resolve_text_mut(
    record: &mut ApplicantRecord,
    path: FieldPath,
) -> Result<Option<&mut String>, PathError> {
    let text = match path {
        FieldPath::FirstName => &mut record.personal.first_name,
        FieldPath::LastName => &mut record.personal.last_name,
        FieldPath::PhoneNumber => &mut record.personal.phone_number,
        FieldPath::Birthdate => &mut record.personal.birthdate,
        FieldPath::Sex | FieldPath::HighestEducationAttained | FieldPath::YearsOfExperience => {
            return Ok(None)
        }
        FieldPath::Experience { entry, field } => {
            check_index(ListPath::Experience, entry, record.experience.len())?;
            let exp = &mut record.experience[entry];
            match field {
                EntryField::Role => &mut exp.role,
                EntryField::Company => &mut exp.company,
                EntryField::Location => &mut exp.location,
                EntryField::StartDate => &mut exp.start_date,
                EntryField::EndDate => &mut exp.end_date,
                EntryField::Description { item } => {
                    check_index(ListPath::Details { entry }, item, exp.details.len())?;
                    &mut exp.details[item].description
                }
            }
        }
    };
    Ok(Some(text))
}

/// Every field path of `record`, in render order.
pub fn all_paths(record: &ApplicantRecord) -> Vec<FieldPath> {
    let mut paths = vec![
        FieldPath::FirstName,
        FieldPath::LastName,
        FieldPath::PhoneNumber,
        FieldPath::Sex,
        FieldPath::Birthdate,
        FieldPath::HighestEducationAttained,
        FieldPath::YearsOfExperience,
    ];
    for (entry, exp) in record.experience.iter().enumerate() {
        paths.extend(entry_paths(entry, exp.details.len()));
    }
    paths
}

fn entry_paths(entry: usize, details: usize) -> impl Iterator<Item = FieldPath> {
    [
        EntryField::Role,
        EntryField::Company,
        EntryField::StartDate,
        EntryField::EndDate,
        EntryField::Location,
    ]
    .into_iter()
    .map(move |field| FieldPath::entry(entry, field))
    .chain((0..details).map(move |item| FieldPath::description(entry, item)))
}
