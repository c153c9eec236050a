//! Error types for the data-access layer
//!
//! Configuration errors are fatal and reported synchronously; not-found on
//! read paths is expressed as `Ok(None)` rather than an error.

use std::fmt;

/// Result type alias for data-access operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for data-access operations
#[derive(Debug, Clone)]
pub enum OrmError {
    /// Underlying store failure
    Database(String),
    /// Entity not found where one was required
    NotFound(String),
    /// Invalid wiring: unknown event, unregistered entity type, unresolvable
    /// navigation metadata
    Configuration(String),
    /// Relationship arrangement failure
    Relationship(String),
    /// Field-map conversion failure
    Serialization(String),
    /// Validation failure surfaced through the data layer
    Validation(String),
    /// Operation not valid for the entity's current tracking state
    State(String),
    /// Session or unit-of-work lifecycle failure
    Connection(String),
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::Database(msg) => write!(f, "Database error: {}", msg),
            OrmError::NotFound(what) => write!(f, "Not found: {}", what),
            OrmError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OrmError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            OrmError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            OrmError::Validation(msg) => write!(f, "Validation error: {}", msg),
            OrmError::State(msg) => write!(f, "State error: {}", msg),
            OrmError::Connection(msg) => write!(f, "Connection error: {}", msg),
        }
    }
}

impl std::error::Error for OrmError {}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for OrmError {
    fn from(err: anyhow::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let err = OrmError::Configuration("unknown entity type 'Ghost'".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown entity type 'Ghost'"
        );

        let err = OrmError::NotFound("Order(42)".to_string());
        assert_eq!(err.to_string(), "Not found: Order(42)");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<i64>("not a number").unwrap_err();
        let err: OrmError = parse_err.into();
        assert!(matches!(err, OrmError::Serialization(_)));
    }
}
