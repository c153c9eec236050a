//! # arbor-core: Shared Foundation for the arbor Data-Access Layer
//!
//! Provides the typed service registry used to resolve optional per-entity
//! hooks at runtime, plus the core error type shared across arbor crates.

pub mod error;
pub mod services;

pub use error::*;
pub use services::*;
