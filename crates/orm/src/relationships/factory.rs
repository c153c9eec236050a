//! Relationship Manager Factory - strategy selection by life-cycle event

use crate::error::{OrmError, OrmResult};
use crate::events::DomainEvent;
use crate::relationships::create::CreateRelationshipManager;
use crate::relationships::delete::DeleteRelationshipManager;
use crate::relationships::manager::RelationshipManager;
use crate::relationships::update::UpdateRelationshipManager;

/// Create the arrangement strategy for a life-cycle event, wired to a fresh
/// reference container. The empty event is a configuration error.
pub fn create_relationship_manager(event: DomainEvent) -> OrmResult<Box<dyn RelationshipManager>> {
    match event {
        DomainEvent::Created => Ok(Box::new(CreateRelationshipManager::new())),
        DomainEvent::Updated => Ok(Box::new(UpdateRelationshipManager::new())),
        DomainEvent::Deleted => Ok(Box::new(DeleteRelationshipManager::new())),
        DomainEvent::None => Err(OrmError::Configuration(
            "no relationship manager is defined for the empty domain event".to_string(),
        )),
    }
}
