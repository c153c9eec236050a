//! Unit of Work - owns one store session for one use case
//!
//! Hands out transient repositories and relationship managers, aggregates
//! domain events, and commits once. Disposal releases the session exactly
//! once; double-dispose is a no-op by construction and `Drop` disposes.

use tracing::debug;

use crate::entity::EntityDef;
use crate::error::{OrmError, OrmResult};
use crate::events::{DomainEvent, EntityEvent};
use crate::relationships::factory::create_relationship_manager;
use crate::relationships::loader::RelationshipLoader;
use crate::relationships::manager::RelationshipManager;
use crate::repository::Repository;
use crate::store::StoreSession;

/// One unit of work over one store session
pub struct UnitOfWork<S: StoreSession> {
    session: Option<S>,
    events: Vec<EntityEvent>,
}

impl<S: StoreSession> UnitOfWork<S> {
    /// Take ownership of a session
    pub fn new(session: S) -> Self {
        Self {
            session: Some(session),
            events: Vec::new(),
        }
    }

    fn disposed_error() -> OrmError {
        OrmError::Connection("unit of work has been disposed".to_string())
    }

    /// Borrow the owned session
    pub fn session(&self) -> OrmResult<&S> {
        self.session.as_ref().ok_or_else(Self::disposed_error)
    }

    /// Mutably borrow the owned session as a store session
    pub fn session_mut(&mut self) -> OrmResult<&mut dyn StoreSession> {
        match self.session.as_mut() {
            Some(session) => Ok(session),
            None => Err(Self::disposed_error()),
        }
    }

    /// A transient repository for one entity type
    pub fn repository<T: EntityDef>(&mut self) -> OrmResult<Repository<'_, T>> {
        Ok(Repository::new(self.session_mut()?))
    }

    /// An arrangement strategy for the given life-cycle event
    pub fn relationship_manager(
        &self,
        event: DomainEvent,
    ) -> OrmResult<Box<dyn RelationshipManager>> {
        self.session()?;
        create_relationship_manager(event)
    }

    /// A read-path loader over the owned session
    pub fn loader(&self) -> OrmResult<RelationshipLoader<'_>> {
        Ok(RelationshipLoader::new(self.session()?))
    }

    /// Record a domain event for this unit of work
    pub fn record_event(&mut self, event: EntityEvent) {
        self.events.push(event);
    }

    /// Events recorded so far
    pub fn events(&self) -> &[EntityEvent] {
        &self.events
    }

    /// Take all recorded events
    pub fn drain_events(&mut self) -> Vec<EntityEvent> {
        std::mem::take(&mut self.events)
    }

    /// Commit every pending change
    pub fn save_changes(&mut self) -> OrmResult<usize> {
        self.session
            .as_mut()
            .ok_or_else(Self::disposed_error)?
            .save_changes()
    }

    /// Asynchronous counterpart of [`UnitOfWork::save_changes`]
    pub async fn save_changes_async(&mut self) -> OrmResult<usize> {
        self.session
            .as_mut()
            .ok_or_else(Self::disposed_error)?
            .save_changes_async()
            .await
    }

    /// Release the session; safe to call more than once
    pub fn dispose(&mut self) {
        if self.session.take().is_some() {
            debug!("unit of work disposed");
        }
    }

    /// Whether the session has been released
    pub fn is_disposed(&self) -> bool {
        self.session.is_none()
    }
}

impl<S: StoreSession> Drop for UnitOfWork<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySession;

    #[test]
    fn test_dispose_is_idempotent() {
        let mut uow = UnitOfWork::new(MemorySession::new());
        assert!(!uow.is_disposed());

        uow.dispose();
        assert!(uow.is_disposed());

        // double dispose is a required no-op
        uow.dispose();
        assert!(uow.is_disposed());
    }

    #[test]
    fn test_disposed_unit_of_work_rejects_use() {
        let mut uow = UnitOfWork::new(MemorySession::new());
        uow.dispose();

        assert!(matches!(
            uow.save_changes().unwrap_err(),
            OrmError::Connection(_)
        ));
        assert!(uow.session().is_err());
    }

    #[test]
    fn test_event_aggregation() {
        let mut uow = UnitOfWork::new(MemorySession::new());
        assert!(uow.events().is_empty());

        uow.record_event(EntityEvent {
            event: DomainEvent::Created,
            entity_type: "Thing".to_string(),
            entity_id: crate::entity::EntityId::new(1),
            occurred_at: chrono::Utc::now(),
        });
        assert_eq!(uow.events().len(), 1);

        let drained = uow.drain_events();
        assert_eq!(drained.len(), 1);
        assert!(uow.events().is_empty());
    }

    #[tokio::test]
    async fn test_save_changes_async_on_empty_session() {
        let mut uow = UnitOfWork::new(MemorySession::new());
        assert_eq!(uow.save_changes_async().await.unwrap(), 0);
    }
}
