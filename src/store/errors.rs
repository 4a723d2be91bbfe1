//! Record store errors

use std::io;

use thiserror::Error;

use crate::model::{UniqueField, ValidationError};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Payload rejected by the store: empty required field or unique index violation
    #[error("{0}")]
    Validation(String),

    /// Handle closed, lock poisoned, or backend failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Log record failed checksum or structure verification
    #[error("corrupted log at offset {offset}: {reason}")]
    Corrupted { offset: u64, reason: String },

    /// Connection string could not be parsed
    #[error("invalid store URI: {0}")]
    InvalidUri(String),

    /// Filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn corrupted(offset: u64, reason: impl Into<String>) -> Self {
        StoreError::Corrupted {
            offset,
            reason: reason.into(),
        }
    }

    /// Unique index violation detected by the store itself
    pub fn duplicate_key(field: UniqueField, value: &str) -> Self {
        StoreError::Validation(format!(
            "duplicate key: {} {:?} already exists",
            field.json_name(),
            value
        ))
    }

    pub(crate) fn closed() -> Self {
        StoreError::Unavailable("store is closed".to_string())
    }

    pub(crate) fn poisoned() -> Self {
        StoreError::Unavailable("store lock poisoned".to_string())
    }

    /// Whether this error is caused by the submitted data rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_message() {
        let err = StoreError::duplicate_key(UniqueField::RegistrationNumber, "001");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "duplicate key: registrationNumber \"001\" already exists"
        );
    }

    #[test]
    fn test_corruption_mentions_offset() {
        let err = StoreError::corrupted(128, "checksum mismatch");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("offset 128"));
    }
}
