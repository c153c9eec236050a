//! Scalar association reconciliation
//!
//! Shared by the update strategy and by custom per-entity wiring that
//! bypasses the generic relationship manager. The persisted foreign-key
//! value is read before the in-memory navigation pointer is touched;
//! clearing first would make the previous value unrecoverable without a
//! round-trip.

use tracing::debug;

use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::metadata::{EntityRegistry, ReferenceDescriptor};
use crate::relationships::arrange;
use crate::store::{AssociationChange, StoreSession};

/// Reconcile one scalar reference against its previously persisted value,
/// recording the transition and detaching the navigation pointer (the
/// scalar id is preserved for the save pass).
pub(crate) fn reconcile_reference(
    session: &mut dyn StoreSession,
    entity: &mut dyn Entity,
    reference: &ReferenceDescriptor,
) -> OrmResult<()> {
    // read before clearing: the persisted value is the diff baseline
    let persisted = session.reference_id(entity, reference.name)?;
    let current = (reference.accessor.target_id)(entity.as_any());

    match (persisted, current) {
        (None, Some(new_id)) => {
            session.record_association_change(
                entity,
                reference.name,
                AssociationChange::Added(new_id),
            )?;
        }
        (Some(old_id), Some(new_id)) if old_id != new_id => {
            session.record_association_change(
                entity,
                reference.name,
                AssociationChange::Removed(old_id),
            )?;
            session.record_association_change(
                entity,
                reference.name,
                AssociationChange::Added(new_id),
            )?;
        }
        (Some(old_id), None) => {
            session.record_association_change(
                entity,
                reference.name,
                AssociationChange::Removed(old_id),
            )?;
        }
        _ => {
            debug!(
                entity_type = entity.entity_type(),
                reference = reference.name,
                "association unchanged"
            );
        }
    }

    (reference.accessor.detach)(entity.as_any_mut());
    Ok(())
}

/// Reconciles a single named association for flows that wire relationships
/// per entity instead of through the generic relationship manager.
pub struct EntityAssociationUpdater<'a> {
    session: &'a mut dyn StoreSession,
}

impl<'a> EntityAssociationUpdater<'a> {
    /// Create an updater over the given session
    pub fn new(session: &'a mut dyn StoreSession) -> Self {
        Self { session }
    }

    /// Reconcile the named reference of the entity against its persisted
    /// value. An unknown reference name is a configuration error.
    pub fn update_association(
        &mut self,
        entity: &mut dyn Entity,
        reference_name: &str,
    ) -> OrmResult<()> {
        let descriptor = EntityRegistry::global().descriptor_of(entity)?;
        let reference = descriptor
            .reference(reference_name)
            .cloned()
            .ok_or_else(|| {
                OrmError::Configuration(format!(
                    "entity '{}' has no registered reference '{}'",
                    descriptor.name, reference_name
                ))
            })?;

        arrange::attach_entity_unchanged(self.session, entity)?;
        reconcile_reference(self.session, entity, &reference)
    }
}
