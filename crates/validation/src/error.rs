//! Validation error types and aggregation

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// Individual validation failure for a specific field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
}

impl ValidationError {
    /// Create a new validation error with the default code
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: "validation_failed".to_string(),
        }
    }

    /// Create a validation error with a specific code
    pub fn with_code(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Aggregate of validation errors, one entry per failing field
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
pub struct ValidationErrors {
    /// Map of field names to their validation errors
    pub errors: HashMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.entry(error.field.clone()).or_default().push(error);
    }

    /// Add a simple error from field and message
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.add(ValidationError::new(field, message));
    }

    /// Merge another collection into this one
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }

    /// Whether the collection holds no errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one error
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Total errors across all fields
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|v| v.len()).sum()
    }

    /// Errors recorded for a specific field
    pub fn field_errors(&self, field: &str) -> Option<&Vec<ValidationError>> {
        self.errors.get(field)
    }

    /// Whether a specific field has errors
    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.get(field).map(|e| !e.is_empty()).unwrap_or(false)
    }

    /// Turn a non-empty collection into an `Err`, an empty one into `Ok(())`
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else {
            write!(f, "Validation failed for {} field(s):", self.errors.len())?;
            for (field, field_errors) in &self.errors {
                for error in field_errors {
                    write!(f, "\n  {}: {}", field, error.message)?;
                }
            }
            Ok(())
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_creation() {
        let error = ValidationError::new("email", "Invalid email format");
        assert_eq!(error.field, "email");
        assert_eq!(error.message, "Invalid email format");
        assert_eq!(error.code, "validation_failed");

        let coded = ValidationError::with_code("age", "Must be positive", "positive_number");
        assert_eq!(coded.code, "positive_number");
    }

    #[test]
    fn test_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add_error("email", "Invalid format");
        errors.add_error("age", "Must be positive");
        errors.add_error("email", "Already exists");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.total_errors(), 3);
        assert!(errors.has_field_errors("email"));
        assert_eq!(errors.field_errors("email").unwrap().len(), 2);
        assert!(!errors.has_field_errors("name"));
    }

    #[test]
    fn test_merge() {
        let mut first = ValidationErrors::new();
        first.add_error("field1", "Error 1");

        let mut second = ValidationErrors::new();
        second.add_error("field2", "Error 2");
        second.add_error("field1", "Error 3");

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.total_errors(), 3);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add_error("name", "Required");
        assert!(errors.into_result().is_err());
    }
}
