//! Core Entity Trait - Base definition for persisted aggregate members
//!
//! Defines the object-safe `Entity` trait, the statically-described
//! `EntityDef` counterpart used for metadata registration and generic field
//! mapping, and identity-based equality.

use std::any::Any;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entity::identity::EntityId;
use crate::metadata::EntityDescriptor;

/// Object-safe trait for persisted aggregate members
pub trait Entity: Debug + Send {
    /// The registered entity-type name of this instance
    fn entity_type(&self) -> &'static str;

    /// The surrogate key; default means "not yet persisted"
    fn id(&self) -> EntityId;

    /// Set the surrogate key (called by the store on insert)
    fn set_id(&mut self, id: EntityId);

    /// Up-cast for property access through registered accessors
    fn as_any(&self) -> &dyn Any;

    /// Mutable up-cast for property access through registered accessors
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Consume the boxed entity for typed recovery
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Static side of an entity type: name and registered metadata
///
/// The serde bounds let the descriptor derive generic field-map conversion
/// without reflection; navigation containers serialize as foreign-key
/// scalars so field maps carry plain columns only.
pub trait EntityDef: Entity + Serialize + DeserializeOwned + Sized + 'static {
    /// The entity-type name under which metadata is registered
    fn entity_name() -> &'static str;

    /// Build the metadata descriptor for this type
    fn descriptor() -> EntityDescriptor;
}

/// Identity-based equality over entities.
///
/// Two entities are equal iff both carry a persisted id and those ids (and
/// types) match, or they are the very same allocation. Two unsaved entities
/// are never equal, even when compared by value, so unsaved instances are
/// never accidentally de-duplicated.
pub fn entities_equal(a: &dyn Entity, b: &dyn Entity) -> bool {
    if std::ptr::addr_eq(a as *const dyn Entity, b as *const dyn Entity) {
        return true;
    }
    a.id().is_persisted()
        && b.id().is_persisted()
        && a.id() == b.id()
        && a.entity_type() == b.entity_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        id: EntityId,
        label: String,
    }

    impl Entity for Probe {
        fn entity_type(&self) -> &'static str {
            "Probe"
        }

        fn id(&self) -> EntityId {
            self.id
        }

        fn set_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }
    }

    #[test]
    fn test_unsaved_entities_never_equal_by_value() {
        let a = Probe {
            id: EntityId::default(),
            label: "same".to_string(),
        };
        let b = Probe {
            id: EntityId::default(),
            label: "same".to_string(),
        };
        // value-identical but unsaved: not equal
        assert!(!entities_equal(&a, &b));

        let c = a.clone();
        assert!(!entities_equal(&a, &c));
    }

    #[test]
    fn test_same_instance_is_equal_even_unsaved() {
        let a = Probe {
            id: EntityId::default(),
            label: "x".to_string(),
        };
        assert!(entities_equal(&a, &a));
    }

    #[test]
    fn test_persisted_ids_define_equality() {
        let a = Probe {
            id: EntityId::new(5),
            label: "a".to_string(),
        };
        let b = Probe {
            id: EntityId::new(5),
            label: "totally different".to_string(),
        };
        let c = Probe {
            id: EntityId::new(6),
            label: "a".to_string(),
        };
        assert!(entities_equal(&a, &b));
        assert!(!entities_equal(&a, &c));
    }
}
