//! Reference Container - per-pass analysis of an entity's object graph
//!
//! One container is created per arrangement pass, used once, and discarded.
//! Analysis strips every collection off the live entity so the store never
//! auto-traverses it: collections whose element type declares a matching
//! parent back-reference on an aggregate root become owned child
//! collections; every other collection is held aside and written back by
//! `restore_references` once the store-facing pass is over.

use tracing::debug;

use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::metadata::{
    CollectionAccessor, CollectionDescriptor, EntityRegistry, ReferenceDescriptor,
};

/// An owned child collection stripped from an aggregate root during analysis
#[derive(Debug)]
pub struct OwnedCollection {
    /// Collection property name on the root
    pub name: &'static str,
    /// Registered name of the child entity type
    pub child_type: &'static str,
    /// Accessor used to re-attach the collection value
    pub accessor: CollectionAccessor,
    /// Child-side back-reference to the root
    pub parent_reference: ReferenceDescriptor,
    /// Scalar reference properties declared on the child type
    pub child_references: Vec<ReferenceDescriptor>,
    /// Whether the collection was materialized in memory when analyzed.
    /// An unloaded collection makes no statement about the child set.
    pub loaded: bool,
    /// The stripped children; empty when the collection was unloaded
    pub children: Vec<Box<dyn Entity>>,
}

/// Per-pass reference analysis state
#[derive(Debug, Default)]
pub struct ReferenceContainer {
    analyzed: bool,
    relationships: Vec<ReferenceDescriptor>,
    child_relationships: Vec<ReferenceDescriptor>,
    owned: Vec<OwnedCollection>,
    held: Vec<(CollectionDescriptor, Vec<Box<dyn Entity>>)>,
}

impl ReferenceContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the entity's registered properties once, stripping collections
    /// off the live object and classifying everything.
    ///
    /// Owned children missing their parent back-reference get it populated
    /// with the entity's id here, before any arrangement proceeds.
    pub fn analyze_references(&mut self, entity: &mut dyn Entity) -> OrmResult<()> {
        let descriptor = EntityRegistry::global().descriptor_of(entity)?;
        let entity_id = entity.id();

        self.relationships = descriptor.references.clone();

        for collection in &descriptor.collections {
            let taken = (collection.accessor.take)(entity.as_any_mut());

            let ownership = if descriptor.aggregate_root {
                EntityRegistry::global()
                    .try_descriptor(collection.child_type)
                    .and_then(|child_descriptor| {
                        child_descriptor
                            .parent_reference_to(descriptor.name)
                            .cloned()
                            .map(|parent_reference| (child_descriptor, parent_reference))
                    })
            } else {
                None
            };

            match ownership {
                Some((child_descriptor, parent_reference)) => {
                    let loaded = taken.is_some();
                    let mut children = taken.unwrap_or_default();
                    for child in children.iter_mut() {
                        if (parent_reference.accessor.target_id)(child.as_any()).is_none() {
                            (parent_reference.accessor.set_target_id)(
                                child.as_any_mut(),
                                Some(entity_id),
                            );
                        }
                    }
                    debug!(
                        entity_type = descriptor.name,
                        collection = collection.name,
                        children = children.len(),
                        "classified owned child collection"
                    );
                    self.child_relationships
                        .extend(child_descriptor.references.iter().cloned());
                    self.owned.push(OwnedCollection {
                        name: collection.name,
                        child_type: collection.child_type,
                        accessor: collection.accessor.clone(),
                        parent_reference,
                        child_references: child_descriptor.references.clone(),
                        loaded,
                        children,
                    });
                }
                None => {
                    // no structurally-declared ownership: strip and hold for
                    // restore, never reconcile against the store
                    if let Some(children) = taken {
                        debug!(
                            entity_type = descriptor.name,
                            collection = collection.name,
                            "held opaque collection"
                        );
                        self.held.push((collection.clone(), children));
                    }
                }
            }
        }

        self.analyzed = true;
        Ok(())
    }

    fn ensure_analyzed(&self) -> OrmResult<()> {
        if self.analyzed {
            Ok(())
        } else {
            Err(OrmError::State(
                "reference container used before analyze_references".to_string(),
            ))
        }
    }

    /// Scalar reference properties discovered by the analysis
    pub fn relationships(&self) -> OrmResult<&[ReferenceDescriptor]> {
        self.ensure_analyzed()?;
        Ok(&self.relationships)
    }

    /// Scalar reference properties declared on the child element types
    pub fn child_relationships(&self) -> OrmResult<&[ReferenceDescriptor]> {
        self.ensure_analyzed()?;
        Ok(&self.child_relationships)
    }

    /// Drain the owned child collections; a second call yields an empty set
    pub fn take_child_collections(&mut self) -> OrmResult<Vec<OwnedCollection>> {
        self.ensure_analyzed()?;
        Ok(std::mem::take(&mut self.owned))
    }

    /// Write every held non-owned collection back onto the entity, undoing
    /// the stripping performed during analysis
    pub fn restore_references(&mut self, entity: &mut dyn Entity) {
        for (descriptor, items) in self.held.drain(..) {
            (descriptor.accessor.restore)(entity.as_any_mut(), items);
        }
    }

    /// Whether analysis has run
    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }
}
