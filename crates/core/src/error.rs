//! Core error types shared across the arbor crates

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Service not found: {service}")]
    ServiceNotFound { service: String },

    #[error("Service registration failed: {message}")]
    RegistrationFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl CoreError {
    /// Create a not-found error for a named service
    pub fn service_not_found(service: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service: service.into(),
        }
    }
}
