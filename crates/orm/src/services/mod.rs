//! Service Layer - use-case orchestration over the data-access core

pub mod crud;

pub use crud::*;

use thiserror::Error;

use arbor_validation::ValidationErrors;

use crate::error::OrmError;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Aggregate validation failure, collected before any store mutation
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Data-access failure
    #[error(transparent)]
    Orm(#[from] OrmError),
}

impl ServiceError {
    /// The validation errors, when this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ServiceError::Validation(errors) => Some(errors),
            ServiceError::Orm(_) => None,
        }
    }
}
