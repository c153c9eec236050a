//! Update strategy - arrangement for edited aggregate roots

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::entity::{Entity, EntityId};
use crate::error::OrmResult;
use crate::events::DomainEvent;
use crate::metadata::ReferenceDescriptor;
use crate::relationships::arrange;
use crate::relationships::association::reconcile_reference;
use crate::relationships::container::{OwnedCollection, ReferenceContainer};
use crate::relationships::manager::RelationshipManager;
use crate::store::{EntityState, StoreSession};

/// Arrangement for entity updates.
///
/// Scalar references are fully reconciled against the previously persisted
/// foreign-key value. Owned collections are diffed: new children (default
/// id) are inserted before the persisted set is reloaded, children present
/// in both sets are marked modified, and children persisted but absent from
/// memory are removed.
#[derive(Debug, Default)]
pub struct UpdateRelationshipManager {
    container: ReferenceContainer,
}

impl UpdateRelationshipManager {
    /// Create the strategy with a fresh reference container
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipManager for UpdateRelationshipManager {
    fn event(&self) -> DomainEvent {
        DomainEvent::Updated
    }

    fn container_mut(&mut self) -> &mut ReferenceContainer {
        &mut self.container
    }

    fn requires_attach(&self) -> bool {
        true
    }

    fn arrange_entity_relationship(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
        reference: &ReferenceDescriptor,
    ) -> OrmResult<()> {
        reconcile_reference(session, entity, reference)
    }

    fn arrange_child_collection(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
        collection: OwnedCollection,
    ) -> OrmResult<()> {
        // an unloaded collection makes no statement about the child set, so
        // there is nothing to diff against
        if !collection.loaded {
            return Ok(());
        }
        let parent_id = entity.id();

        // new vs existing is decided solely by the child's id
        let (mut new_children, existing): (Vec<Box<dyn Entity>>, Vec<Box<dyn Entity>>) = collection
            .children
            .into_iter()
            .partition(|child| !child.id().is_persisted());

        // insert new children before reloading the persisted set, so they
        // cannot show up in the removed diff
        for child in new_children.iter_mut() {
            if (collection.parent_reference.accessor.target_id)(child.as_any()).is_none() {
                (collection.parent_reference.accessor.set_target_id)(
                    child.as_any_mut(),
                    Some(parent_id),
                );
            }
            arrange::attach_reference_targets(session, child.as_ref(), &collection.child_references)?;
            session.insert(child.as_mut())?;
        }

        let persisted = session.load_children(
            entity,
            collection.child_type,
            collection.parent_reference.name,
        )?;

        let existing_ids: HashSet<EntityId> = existing.iter().map(|child| child.id()).collect();
        let persisted_ids: HashSet<EntityId> = persisted.iter().map(|child| child.id()).collect();

        let mut removed = 0;
        for child in &persisted {
            if !existing_ids.contains(&child.id()) {
                session.remove(child.as_ref())?;
                removed += 1;
            }
        }

        for child in &existing {
            if persisted_ids.contains(&child.id()) {
                session.set_entity_state(child.as_ref(), EntityState::Modified)?;
            } else {
                // a child claiming persistence that the store no longer has;
                // left to the store's own stale-state reporting at save
                warn!(
                    child_type = collection.child_type,
                    id = child.id().raw(),
                    "in-memory child not found in persisted set"
                );
            }
        }

        debug!(
            collection = collection.name,
            inserted = new_children.len(),
            modified = existing.len(),
            removed,
            "reconciled owned children"
        );

        // re-attach the full collection, newly-inserted children included
        let mut all = existing;
        all.extend(new_children);
        (collection.accessor.restore)(entity.as_any_mut(), all);
        Ok(())
    }
}
