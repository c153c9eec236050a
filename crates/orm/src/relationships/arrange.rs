//! Attach-state adjustment helpers shared by the arrangement strategies

use tracing::debug;

use crate::entity::Entity;
use crate::error::OrmResult;
use crate::metadata::ReferenceDescriptor;
use crate::store::{EntityState, StoreSession};

/// Attach a detached, persisted entity to the session as unchanged.
///
/// Unsaved entities are left alone: there is no row to attach, and new
/// entities reach the session through insert instead.
pub fn attach_entity_unchanged(
    session: &mut dyn StoreSession,
    entity: &dyn Entity,
) -> OrmResult<()> {
    if !entity.id().is_persisted() {
        return Ok(());
    }
    if session.entity_state(entity) == EntityState::Detached {
        debug!(
            entity_type = entity.entity_type(),
            id = entity.id().raw(),
            "attaching detached entity as unchanged"
        );
        session.set_entity_state(entity, EntityState::Unchanged)?;
    }
    Ok(())
}

/// Default scalar-reference arrangement: a non-null referenced entity that
/// is store-detached is treated as persisted elsewhere and marked unchanged.
/// The association pointer itself is never modified.
pub fn attach_reference_target_unchanged(
    session: &mut dyn StoreSession,
    entity: &dyn Entity,
    reference: &ReferenceDescriptor,
) -> OrmResult<()> {
    if let Some(target) = (reference.accessor.get)(entity.as_any()) {
        if target.id().is_persisted() && session.entity_state(target) == EntityState::Detached {
            debug!(
                entity_type = entity.entity_type(),
                reference = reference.name,
                target_id = target.id().raw(),
                "marking referenced entity unchanged"
            );
            session.set_entity_state(target, EntityState::Unchanged)?;
        }
    }
    Ok(())
}

/// Apply the default scalar arrangement to each of a child's own references
pub fn attach_reference_targets(
    session: &mut dyn StoreSession,
    entity: &dyn Entity,
    references: &[ReferenceDescriptor],
) -> OrmResult<()> {
    for reference in references {
        attach_reference_target_unchanged(session, entity, reference)?;
    }
    Ok(())
}
