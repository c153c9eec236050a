//! Entity Metadata Descriptors - registered structure of each entity type
//!
//! A descriptor declares an entity type's scalar references and collection
//! properties, its aggregate-root capability, and generic field-map
//! conversion. The parent marker sits on the child-side reference that
//! points back at the owning aggregate root.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::{Entity, EntityId};
use crate::error::{OrmError, OrmResult};
use crate::metadata::accessors::{CollectionAccessor, ReferenceAccessor};

/// Metadata for one scalar reference property
#[derive(Debug, Clone)]
pub struct ReferenceDescriptor {
    /// Property name (also the foreign-key column in field maps)
    pub name: &'static str,
    /// Registered name of the referenced entity type
    pub target_type: &'static str,
    /// Whether this is the child-side back-reference to the owning root
    pub parent: bool,
    /// Property accessor bundle
    pub accessor: ReferenceAccessor,
}

impl ReferenceDescriptor {
    /// Create a reference descriptor
    pub fn new(name: &'static str, target_type: &'static str, accessor: ReferenceAccessor) -> Self {
        Self {
            name,
            target_type,
            parent: false,
            accessor,
        }
    }

    /// Mark this reference as the parent back-reference
    pub fn parent(mut self) -> Self {
        self.parent = true;
        self
    }

    /// Read the in-memory target id off an entity
    pub fn target_id(&self, entity: &dyn Entity) -> Option<EntityId> {
        (self.accessor.target_id)(entity.as_any())
    }
}

/// Metadata for one collection property
#[derive(Debug, Clone)]
pub struct CollectionDescriptor {
    /// Property name
    pub name: &'static str,
    /// Registered name of the element entity type
    pub child_type: &'static str,
    /// Property accessor bundle
    pub accessor: CollectionAccessor,
}

impl CollectionDescriptor {
    /// Create a collection descriptor
    pub fn new(name: &'static str, child_type: &'static str, accessor: CollectionAccessor) -> Self {
        Self {
            name,
            child_type,
            accessor,
        }
    }
}

/// Registered metadata for one entity type
#[derive(Clone)]
pub struct EntityDescriptor {
    /// Registered entity-type name
    pub name: &'static str,
    /// Whether child collections are life-cycle-owned by this type
    pub aggregate_root: bool,
    /// Scalar reference properties
    pub references: Vec<ReferenceDescriptor>,
    /// Collection properties
    pub collections: Vec<CollectionDescriptor>,
    to_fields: Arc<dyn Fn(&dyn Any) -> OrmResult<Map<String, Value>> + Send + Sync>,
    from_fields: Arc<dyn Fn(&Map<String, Value>) -> OrmResult<Box<dyn Entity>> + Send + Sync>,
}

impl EntityDescriptor {
    /// Create a descriptor for an entity type, deriving field-map conversion
    /// from its serde implementation
    pub fn new<T>(name: &'static str) -> Self
    where
        T: Entity + Serialize + DeserializeOwned + 'static,
    {
        Self {
            name,
            aggregate_root: false,
            references: Vec::new(),
            collections: Vec::new(),
            to_fields: Arc::new(|any: &dyn Any| {
                let entity = any.downcast_ref::<T>().ok_or_else(|| {
                    OrmError::Serialization(format!(
                        "entity does not match descriptor type '{}'",
                        std::any::type_name::<T>()
                    ))
                })?;
                match serde_json::to_value(entity)? {
                    Value::Object(map) => Ok(map),
                    other => Err(OrmError::Serialization(format!(
                        "entity '{}' serialized to non-object value: {}",
                        std::any::type_name::<T>(),
                        other
                    ))),
                }
            }),
            from_fields: Arc::new(|fields: &Map<String, Value>| {
                let entity: T = serde_json::from_value(Value::Object(fields.clone()))?;
                Ok(Box::new(entity) as Box<dyn Entity>)
            }),
        }
    }

    /// Mark this type as an aggregate root (children are cascade-owned)
    pub fn aggregate_root(mut self) -> Self {
        self.aggregate_root = true;
        self
    }

    /// Add a scalar reference property
    pub fn with_reference(mut self, reference: ReferenceDescriptor) -> Self {
        self.references.push(reference);
        self
    }

    /// Add a collection property
    pub fn with_collection(mut self, collection: CollectionDescriptor) -> Self {
        self.collections.push(collection);
        self
    }

    /// Whether this type owns its child collections
    pub fn is_aggregate_root(&self) -> bool {
        self.aggregate_root
    }

    /// Look up a reference property by name
    pub fn reference(&self, name: &str) -> Option<&ReferenceDescriptor> {
        self.references.iter().find(|r| r.name == name)
    }

    /// Look up a collection property by name
    pub fn collection(&self, name: &str) -> Option<&CollectionDescriptor> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// The parent-marked back-reference targeting the given type, if any
    pub fn parent_reference_to(&self, parent_type: &str) -> Option<&ReferenceDescriptor> {
        self.references
            .iter()
            .find(|r| r.parent && r.target_type == parent_type)
    }

    /// Convert an entity instance to its generic field map
    pub fn to_field_map(&self, entity: &dyn Entity) -> OrmResult<Map<String, Value>> {
        (self.to_fields)(entity.as_any())
    }

    /// Materialize an entity instance from a generic field map
    pub fn from_field_map(&self, fields: &Map<String, Value>) -> OrmResult<Box<dyn Entity>> {
        (self.from_fields)(fields)
    }

    /// Clone an entity through its field map (navigation state is not
    /// carried over)
    pub fn clone_boxed(&self, entity: &dyn Entity) -> OrmResult<Box<dyn Entity>> {
        let fields = self.to_field_map(entity)?;
        self.from_field_map(&fields)
    }

    /// Validate the descriptor for consistency
    pub fn validate(&self) -> OrmResult<()> {
        if self.name.is_empty() {
            return Err(OrmError::Configuration(
                "entity descriptor must have a non-empty name".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for reference in &self.references {
            if reference.name.is_empty() {
                return Err(OrmError::Configuration(format!(
                    "entity '{}' has a reference with an empty name",
                    self.name
                )));
            }
            if !seen.insert(reference.name) {
                return Err(OrmError::Configuration(format!(
                    "entity '{}' declares property '{}' more than once",
                    self.name, reference.name
                )));
            }
        }
        for collection in &self.collections {
            if collection.name.is_empty() {
                return Err(OrmError::Configuration(format!(
                    "entity '{}' has a collection with an empty name",
                    self.name
                )));
            }
            if !seen.insert(collection.name) {
                return Err(OrmError::Configuration(format!(
                    "entity '{}' declares property '{}' more than once",
                    self.name, collection.name
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("aggregate_root", &self.aggregate_root)
            .field("references", &self.references)
            .field("collections", &self.collections)
            .finish()
    }
}
