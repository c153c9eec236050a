//! Delete strategy - cascade removal of owned children

use tracing::debug;

use crate::entity::Entity;
use crate::error::OrmResult;
use crate::events::DomainEvent;
use crate::relationships::container::{OwnedCollection, ReferenceContainer};
use crate::relationships::manager::RelationshipManager;
use crate::store::StoreSession;

/// Arrangement for entity deletion.
///
/// Scalar references keep the default attach-as-unchanged behavior. Owned
/// collections cascade: the in-memory collection is discarded, the persisted
/// children are reloaded, and every one is removed from the store.
#[derive(Debug, Default)]
pub struct DeleteRelationshipManager {
    container: ReferenceContainer,
}

impl DeleteRelationshipManager {
    /// Create the strategy with a fresh reference container
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipManager for DeleteRelationshipManager {
    fn event(&self) -> DomainEvent {
        DomainEvent::Deleted
    }

    fn container_mut(&mut self) -> &mut ReferenceContainer {
        &mut self.container
    }

    fn requires_attach(&self) -> bool {
        true
    }

    fn arrange_child_collection(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
        collection: OwnedCollection,
    ) -> OrmResult<()> {
        // the in-memory collection is irrelevant for a cascade delete
        drop(collection.children);

        let persisted = session.load_children(
            entity,
            collection.child_type,
            collection.parent_reference.name,
        )?;

        debug!(
            collection = collection.name,
            removed = persisted.len(),
            "cascading delete to owned children"
        );

        for child in &persisted {
            session.remove(child.as_ref())?;
        }
        Ok(())
    }
}
