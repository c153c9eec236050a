//! Entity Registry - process-wide metadata storage
//!
//! Descriptors are registered once per entity type and shared read-only
//! across unit-of-work instances, so reference analysis never rebuilds
//! metadata per operation.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::entity::{Entity, EntityDef};
use crate::error::{OrmError, OrmResult};
use crate::metadata::descriptors::EntityDescriptor;

static GLOBAL_REGISTRY: Lazy<EntityRegistry> = Lazy::new(EntityRegistry::new);

/// Thread-safe registry of entity descriptors keyed by entity-type name
#[derive(Debug, Default)]
pub struct EntityRegistry {
    descriptors: DashMap<&'static str, Arc<EntityDescriptor>>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            descriptors: DashMap::new(),
        }
    }

    /// The process-wide registry instance
    pub fn global() -> &'static EntityRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register an entity type; re-registration replaces the descriptor
    pub fn register<T: EntityDef>(&self) -> OrmResult<()> {
        self.register_descriptor(T::descriptor())
    }

    /// Register a pre-built descriptor after validating it
    pub fn register_descriptor(&self, descriptor: EntityDescriptor) -> OrmResult<()> {
        descriptor.validate()?;
        debug!(entity_type = descriptor.name, "registering entity descriptor");
        self.descriptors.insert(descriptor.name, Arc::new(descriptor));
        Ok(())
    }

    /// Look up a descriptor; unknown types are a configuration error
    pub fn descriptor(&self, name: &str) -> OrmResult<Arc<EntityDescriptor>> {
        self.try_descriptor(name).ok_or_else(|| {
            OrmError::Configuration(format!("entity type '{}' is not registered", name))
        })
    }

    /// Look up a descriptor, returning `None` for unknown types
    pub fn try_descriptor(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.descriptors.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up the descriptor for an entity instance
    pub fn descriptor_of(&self, entity: &dyn Entity) -> OrmResult<Arc<EntityDescriptor>> {
        self.descriptor(entity.entity_type())
    }

    /// Whether the given type name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Number of registered entity types
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::any::Any;

    use crate::entity::EntityId;

    #[derive(Debug, Serialize, Deserialize)]
    struct Plain {
        id: EntityId,
    }

    impl Entity for Plain {
        fn entity_type(&self) -> &'static str {
            "RegistryTestPlain"
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

    impl EntityDef for Plain {
        fn entity_name() -> &'static str {
            "RegistryTestPlain"
        }

        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new::<Plain>("RegistryTestPlain")
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = EntityRegistry::new();
        registry.register::<Plain>().unwrap();

        assert!(registry.contains("RegistryTestPlain"));
        let descriptor = registry.descriptor("RegistryTestPlain").unwrap();
        assert_eq!(descriptor.name, "RegistryTestPlain");
        assert!(!descriptor.is_aggregate_root());
    }

    #[test]
    fn test_unknown_type_is_configuration_error() {
        let registry = EntityRegistry::new();
        let err = registry.descriptor("Ghost").unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn test_descriptor_of_instance() {
        let registry = EntityRegistry::new();
        registry.register::<Plain>().unwrap();

        let entity = Plain {
            id: EntityId::new(1),
        };
        let descriptor = registry.descriptor_of(&entity).unwrap();
        assert_eq!(descriptor.name, "RegistryTestPlain");
    }
}
