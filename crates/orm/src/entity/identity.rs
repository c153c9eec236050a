//! Surrogate identity for persisted entities
//!
//! The default value (`0`) means "not yet persisted"; the store assigns a
//! real id on insert.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer surrogate key for entities
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EntityId(i64);

impl EntityId {
    /// The id carried by entities that have never been saved
    pub const UNSAVED: EntityId = EntityId(0);

    /// Create an id from its raw value
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw integer value
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Whether this id identifies a persisted row
    pub fn is_persisted(self) -> bool {
        self.0 != 0
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unsaved() {
        assert_eq!(EntityId::default(), EntityId::UNSAVED);
        assert!(!EntityId::default().is_persisted());
        assert!(EntityId::new(1).is_persisted());
    }

    #[test]
    fn test_serde_as_bare_number() {
        let id = EntityId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId::new(7).to_string(), "7");
    }
}
