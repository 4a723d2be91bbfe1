//! Student record and payload types
//!
//! JSON field names are camelCase on the wire. Values are stored exactly as
//! submitted; the server neither trims nor lowercases them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// A persisted student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Opaque identifier, generated by the store at creation
    pub id: String,
    pub name: String,
    /// School-assigned registration number (NIS)
    pub registration_number: String,
    pub email: String,
    /// Free-form class label, e.g. "XII-1"
    pub class_label: String,
    /// Program code, see [`super::Major`]
    pub major: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    /// Build a fresh record from a validated payload
    pub fn from_new(id: String, student: NewStudent, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: student.name,
            registration_number: student.registration_number,
            email: student.email,
            class_label: student.class_label,
            major: student.major,
            created_at: now,
            updated_at: now,
        }
    }

    /// Value of one of the unique fields
    pub fn unique_value(&self, field: UniqueField) -> &str {
        match field {
            UniqueField::RegistrationNumber => &self.registration_number,
            UniqueField::Email => &self.email,
        }
    }

    /// Merge a patch into this record and refresh `updated_at`.
    ///
    /// `id` and `created_at` never change.
    pub fn apply(&mut self, patch: StudentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(registration_number) = patch.registration_number {
            self.registration_number = registration_number;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(class_label) = patch.class_label {
            self.class_label = class_label;
        }
        if let Some(major) = patch.major {
            self.major = major;
        }
        self.updated_at = now;
    }
}

/// Fields with a uniqueness constraint across all live records.
///
/// `ALL` is also the order in which conflicts are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    RegistrationNumber,
    Email,
}

impl UniqueField {
    pub const ALL: [UniqueField; 2] = [UniqueField::RegistrationNumber, UniqueField::Email];

    /// JSON name of the field
    pub fn json_name(&self) -> &'static str {
        match self {
            UniqueField::RegistrationNumber => "registrationNumber",
            UniqueField::Email => "email",
        }
    }

    /// Human-readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            UniqueField::RegistrationNumber => "registration number",
            UniqueField::Email => "email",
        }
    }
}

/// Create payload as received over the wire.
///
/// Every field is optional so that all missing fields can be reported at once.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub email: Option<String>,
    pub class_label: Option<String>,
    pub major: Option<String>,
}

impl StudentDraft {
    /// Check that every field is present and non-empty
    pub fn validate(self) -> Result<NewStudent, ValidationError> {
        let mut err = ValidationError::new();
        let name = required(&mut err, "name", self.name);
        let registration_number =
            required(&mut err, "registrationNumber", self.registration_number);
        let email = required(&mut err, "email", self.email);
        let class_label = required(&mut err, "classLabel", self.class_label);
        let major = required(&mut err, "major", self.major);
        err.into_result()?;

        Ok(NewStudent {
            name,
            registration_number,
            email,
            class_label,
            major,
        })
    }
}

fn required(err: &mut ValidationError, field: &str, value: Option<String>) -> String {
    match value {
        None => {
            err.missing(field);
            String::new()
        }
        Some(v) if is_blank(&v) => {
            err.blank(field);
            v
        }
        Some(v) => v,
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validated create payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub registration_number: String,
    pub email: String,
    pub class_label: String,
    pub major: String,
}

impl NewStudent {
    /// Re-check the non-empty invariant.
    ///
    /// The store calls this so that a `NewStudent` built by hand cannot bypass it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        for (field, value) in [
            ("name", &self.name),
            ("registrationNumber", &self.registration_number),
            ("email", &self.email),
            ("classLabel", &self.class_label),
            ("major", &self.major),
        ] {
            if is_blank(value) {
                err.blank(field);
            }
        }
        err.into_result()
    }

    pub fn unique_value(&self, field: UniqueField) -> &str {
        match field {
            UniqueField::RegistrationNumber => &self.registration_number,
            UniqueField::Email => &self.email,
        }
    }
}

/// Partial update payload; absent (or null) fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub email: Option<String>,
    pub class_label: Option<String>,
    pub major: Option<String>,
}

impl StudentPatch {
    /// Fields that are present must not be empty
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        for (field, value) in [
            ("name", &self.name),
            ("registrationNumber", &self.registration_number),
            ("email", &self.email),
            ("classLabel", &self.class_label),
            ("major", &self.major),
        ] {
            if value.as_deref().is_some_and(is_blank) {
                err.blank(field);
            }
        }
        err.into_result()
    }

    /// New value for a unique field, if the patch sets one
    pub fn unique_value(&self, field: UniqueField) -> Option<&str> {
        match field {
            UniqueField::RegistrationNumber => self.registration_number.as_deref(),
            UniqueField::Email => self.email.as_deref(),
        }
    }
}
