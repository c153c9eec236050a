//! Relationship Manager - shared arrangement algorithm
//!
//! One arrangement pass per life-cycle event: analyze the entity's
//! references, optionally attach the entity itself, reconcile each scalar
//! reference, then reconcile each owned child collection. Strategies
//! override how scalar references and child collections are reconciled;
//! the skeleton is shared.
//!
//! Arrangement mutates in-memory reference state and session tracking state
//! only. It must run to completion before the unit of work saves, and the
//! stripped non-owned collections are written back by `restore_references`
//! after the save.

use tracing::debug;

use crate::entity::Entity;
use crate::error::OrmResult;
use crate::events::DomainEvent;
use crate::relationships::arrange;
use crate::relationships::container::{OwnedCollection, ReferenceContainer};
use crate::metadata::ReferenceDescriptor;
use crate::store::StoreSession;

/// Arrangement strategy for one life-cycle event
pub trait RelationshipManager: Send {
    /// The event this strategy arranges for
    fn event(&self) -> DomainEvent;

    /// The per-pass reference container
    fn container_mut(&mut self) -> &mut ReferenceContainer;

    /// Whether the entity itself must be attached to the session before its
    /// relationships are mutated
    fn requires_attach(&self) -> bool {
        false
    }

    /// Reconcile one scalar reference.
    ///
    /// The default treats a non-null, store-detached referenced entity as
    /// already persisted elsewhere and marks it unchanged; it never cascades
    /// an insert of a reference target and never touches the pointer.
    fn arrange_entity_relationship(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
        reference: &ReferenceDescriptor,
    ) -> OrmResult<()> {
        arrange::attach_reference_target_unchanged(session, entity, reference)
    }

    /// Reconcile one owned child collection
    fn arrange_child_collection(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
        collection: OwnedCollection,
    ) -> OrmResult<()>;

    /// Run the full arrangement pass for the entity
    fn prepare_relationships(
        &mut self,
        session: &mut dyn StoreSession,
        entity: &mut dyn Entity,
    ) -> OrmResult<()> {
        debug!(
            entity_type = entity.entity_type(),
            id = entity.id().raw(),
            event = %self.event(),
            "arranging relationships"
        );

        self.container_mut().analyze_references(entity)?;

        if self.requires_attach() {
            arrange::attach_entity_unchanged(session, entity)?;
        }

        let references = self.container_mut().relationships()?.to_vec();
        for reference in &references {
            self.arrange_entity_relationship(session, entity, reference)?;
        }

        let collections = self.container_mut().take_child_collections()?;
        for collection in collections {
            self.arrange_child_collection(session, entity, collection)?;
        }

        Ok(())
    }

    /// Write stripped non-owned collections back onto the entity; call after
    /// the unit of work has saved
    fn restore_references(&mut self, entity: &mut dyn Entity) {
        self.container_mut().restore_references(entity);
    }
}
