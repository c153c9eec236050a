//! Relationship Loader - read-path eager loading of navigation properties

use std::collections::HashMap;

use tracing::debug;

use crate::entity::{Entity, EntityDef, EntityId};
use crate::error::OrmResult;
use crate::metadata::EntityRegistry;
use crate::store::StoreSession;

/// Eager-loads scalar references and owned child collections from the
/// committed store state
pub struct RelationshipLoader<'a> {
    session: &'a dyn StoreSession,
}

impl<'a> RelationshipLoader<'a> {
    /// Create a loader over the given session
    pub fn new(session: &'a dyn StoreSession) -> Self {
        Self { session }
    }

    /// Populate each unloaded scalar reference that carries a target id
    pub fn load_references(&self, entity: &mut dyn Entity) -> OrmResult<()> {
        let descriptor = EntityRegistry::global().descriptor_of(entity)?;

        for reference in &descriptor.references {
            if (reference.accessor.get)(entity.as_any()).is_some() {
                continue;
            }
            let Some(target_id) = (reference.accessor.target_id)(entity.as_any()) else {
                continue;
            };
            if let Some(target) = self.session.find(reference.target_type, target_id)? {
                (reference.accessor.install)(entity.as_any_mut(), target);
            }
        }
        Ok(())
    }

    /// Populate every owned child collection of an aggregate root
    pub fn load_children(&self, entity: &mut dyn Entity) -> OrmResult<()> {
        let descriptor = EntityRegistry::global().descriptor_of(entity)?;
        if !descriptor.is_aggregate_root() {
            return Ok(());
        }

        for collection in &descriptor.collections {
            let Some(child_descriptor) =
                EntityRegistry::global().try_descriptor(collection.child_type)
            else {
                continue;
            };
            let Some(parent_reference) = child_descriptor.parent_reference_to(descriptor.name)
            else {
                continue;
            };
            let children =
                self.session
                    .load_children(entity, collection.child_type, parent_reference.name)?;
            debug!(
                entity_type = descriptor.name,
                collection = collection.name,
                loaded = children.len(),
                "eager-loaded owned children"
            );
            (collection.accessor.restore)(entity.as_any_mut(), children);
        }
        Ok(())
    }

    /// Populate references and owned collections in one go
    pub fn load_graph(&self, entity: &mut dyn Entity) -> OrmResult<()> {
        self.load_references(entity)?;
        self.load_children(entity)
    }

    /// Populate scalar references across a slice of entities, fetching each
    /// referenced type as one id-batch instead of row by row
    pub fn load_references_batch<T: EntityDef>(&self, entities: &mut [T]) -> OrmResult<()> {
        let descriptor = EntityRegistry::global().descriptor(T::entity_name())?;

        for reference in &descriptor.references {
            let mut wanted: Vec<EntityId> = entities
                .iter()
                .filter(|entity| (reference.accessor.get)(entity.as_any()).is_none())
                .filter_map(|entity| (reference.accessor.target_id)(entity.as_any()))
                .collect();
            wanted.sort();
            wanted.dedup();
            if wanted.is_empty() {
                continue;
            }

            let target_descriptor = EntityRegistry::global().descriptor(reference.target_type)?;
            let targets = self.session.find_many(reference.target_type, &wanted)?;
            let by_id: HashMap<EntityId, Box<dyn Entity>> = targets
                .into_iter()
                .map(|target| (target.id(), target))
                .collect();

            for entity in entities.iter_mut() {
                if (reference.accessor.get)(entity.as_any()).is_some() {
                    continue;
                }
                let Some(target_id) = (reference.accessor.target_id)(entity.as_any()) else {
                    continue;
                };
                if let Some(target) = by_id.get(&target_id) {
                    let copy = target_descriptor.clone_boxed(target.as_ref())?;
                    (reference.accessor.install)(entity.as_any_mut(), copy);
                }
            }
        }
        Ok(())
    }
}
