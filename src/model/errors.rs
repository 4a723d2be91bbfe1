//! Payload validation errors

use thiserror::Error;

/// A payload failed validation.
///
/// Collects every offending field so a single response can report all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("student validation failed: {}", .problems.join(", "))]
pub struct ValidationError {
    problems: Vec<String>,
}

impl ValidationError {
    /// Start an empty error; `is_empty` stays true until a problem is pushed
    pub(crate) fn new() -> Self {
        Self {
            problems: Vec::new(),
        }
    }

    pub(crate) fn missing(&mut self, field: &str) {
        self.problems.push(format!("{}: field is required", field));
    }

    pub(crate) fn blank(&mut self, field: &str) {
        self.problems.push(format!("{}: field must not be empty", field));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Ok when no problem was recorded
    pub(crate) fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// The individual problems, in field order
    pub fn problems(&self) -> &[String] {
        &self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lists_every_problem() {
        let mut err = ValidationError::new();
        err.missing("name");
        err.blank("email");

        let message = err.to_string();
        assert_eq!(
            message,
            "student validation failed: name: field is required, email: field must not be empty"
        );
        assert_eq!(err.problems().len(), 2);
    }

    #[test]
    fn test_empty_error_is_ok() {
        assert!(ValidationError::new().into_result().is_ok());
    }
}
