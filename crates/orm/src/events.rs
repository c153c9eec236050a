//! Domain events raised by entity life-cycle operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};

/// Life-cycle event tag for an entity operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DomainEvent {
    /// No event; not a valid input for relationship arrangement
    #[default]
    None,
    /// Entity created
    Created,
    /// Entity updated
    Updated,
    /// Entity deleted
    Deleted,
}

impl std::fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DomainEvent::None => "none",
            DomainEvent::Created => "created",
            DomainEvent::Updated => "updated",
            DomainEvent::Deleted => "deleted",
        };
        write!(f, "{}", name)
    }
}

/// A recorded life-cycle event, aggregated per unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    /// What happened
    pub event: DomainEvent,
    /// Registered name of the entity type
    pub entity_type: String,
    /// Surrogate key of the affected entity
    pub entity_id: EntityId,
    /// When the event was recorded
    pub occurred_at: DateTime<Utc>,
}

impl EntityEvent {
    /// Record an event for an entity instance
    pub fn new(event: DomainEvent, entity: &dyn Entity) -> Self {
        Self {
            event,
            entity_type: entity.entity_type().to_string(),
            entity_id: entity.id(),
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DomainEvent::Created.to_string(), "created");
        assert_eq!(DomainEvent::None.to_string(), "none");
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(DomainEvent::default(), DomainEvent::None);
    }
}
