//! Optional per-entity-type hooks resolved through the service registry
//!
//! Hooks run after the core's relationship creation/update step for flows
//! that need custom related-entity wiring. Absence of a registration is not
//! an error; the step is a no-op.

use std::sync::Arc;

use arbor_core::ServiceMap;

use crate::entity::Entity;
use crate::error::OrmResult;
use crate::store::StoreSession;

/// Custom related-entity wiring after creation
pub trait RelatedEntitiesCreator<T: Entity>: Send + Sync {
    /// Arrange additional related entities for a freshly created entity
    fn create_related(&self, session: &mut dyn StoreSession, entity: &mut T) -> OrmResult<()>;
}

/// Custom related-entity wiring after update
pub trait RelatedEntitiesUpdater<T: Entity>: Send + Sync {
    /// Arrange additional related entities for an updated entity
    fn update_related(&self, session: &mut dyn StoreSession, entity: &mut T) -> OrmResult<()>;
}

/// Run the registered creation hook for `T`, if any
pub fn run_related_creator<T: Entity + 'static>(
    services: &ServiceMap,
    session: &mut dyn StoreSession,
    entity: &mut T,
) -> OrmResult<()> {
    if let Some(hook) = services.resolve::<Arc<dyn RelatedEntitiesCreator<T>>>() {
        hook.create_related(session, entity)?;
    }
    Ok(())
}

/// Run the registered update hook for `T`, if any
pub fn run_related_updater<T: Entity + 'static>(
    services: &ServiceMap,
    session: &mut dyn StoreSession,
    entity: &mut T,
) -> OrmResult<()> {
    if let Some(hook) = services.resolve::<Arc<dyn RelatedEntitiesUpdater<T>>>() {
        hook.update_related(session, entity)?;
    }
    Ok(())
}
