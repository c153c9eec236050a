//! Create strategy - arrangement for brand-new aggregate roots

use tracing::debug;

use crate::entity::Entity;
use crate::error::OrmResult;
use crate::events::DomainEvent;
use crate::relationships::arrange;
use crate::relationships::container::{OwnedCollection, ReferenceContainer};
use crate::relationships::manager::RelationshipManager;
use crate::store::StoreSession;

/// Arrangement for entity creation.
///
/// Scalar references keep the default behavior: persisted targets are
/// attached as unchanged, nothing is cascade-inserted through a reference.
/// Every child in an owned collection is inserted as a new row.
#[derive(Debug, Default)]
pub struct CreateRelationshipManager {
    container: ReferenceContainer,
}

impl CreateRelationshipManager {
    /// Create the strategy with a fresh reference container
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipManager for CreateRelationshipManager {
    fn event(&self) -> DomainEvent {
        DomainEvent::Created
    }

    fn container_mut(&mut self) -> &mut ReferenceContainer {
        &mut self.container
    }

    fn arrange_child_collection(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
        mut collection: OwnedCollection,
    ) -> OrmResult<()> {
        if !collection.loaded {
            return Ok(());
        }
        let parent_id = entity.id();

        for child in collection.children.iter_mut() {
            // the parent id may have been assigned after analysis ran
            if (collection.parent_reference.accessor.target_id)(child.as_any()).is_none() {
                (collection.parent_reference.accessor.set_target_id)(
                    child.as_any_mut(),
                    Some(parent_id),
                );
            }
            arrange::attach_reference_targets(session, child.as_ref(), &collection.child_references)?;
            session.insert(child.as_mut())?;
        }

        debug!(
            collection = collection.name,
            inserted = collection.children.len(),
            "inserted owned children"
        );

        // hand the collection back so the caller's graph keeps the children
        // with their assigned ids
        (collection.accessor.restore)(entity.as_any_mut(), collection.children);
        Ok(())
    }
}
