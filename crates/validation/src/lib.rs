//! # arbor-validation: Entity Validation for the arbor Data-Access Layer
//!
//! Validation runs over an entity's generic field map before any store
//! mutation is attempted. Failures are collected exhaustively, one list of
//! messages per field, and returned as a single aggregate error.

pub mod error;
pub mod rules;
pub mod validator;

pub use error::*;
pub use rules::*;
pub use validator::*;
