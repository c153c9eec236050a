//! Store Session Abstraction - tracking-state and persistence boundary
//!
//! The relationship-arrangement engine mutates in-memory reference state and
//! session tracking state only; durability is deferred to the single
//! `save_changes` call per unit of work. All read methods observe committed
//! state, never pending changes.

pub mod memory;

pub use memory::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::OrmResult;

/// Tracking state of an entity within a store session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Not tracked by the session
    Detached,
    /// Tracked, no pending changes
    Unchanged,
    /// Pending insert
    Added,
    /// Pending update
    Modified,
    /// Pending removal
    Deleted,
}

/// A recorded scalar-association transition for one reference property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationChange {
    /// The reference now points at the given id
    Added(EntityId),
    /// The reference no longer points at the given id
    Removed(EntityId),
}

/// Tracking key of an entity: registered type name plus surrogate id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub entity_type: String,
    pub id: EntityId,
}

impl EntityKey {
    /// The tracking key of an entity instance
    pub fn of(entity: &dyn Entity) -> Self {
        Self {
            entity_type: entity.entity_type().to_string(),
            id: entity.id(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.entity_type, self.id)
    }
}

/// Store session options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// First value handed out by each per-type id sequence
    pub sequence_start: i64,
    /// Keep the association-change log after `save_changes` instead of
    /// draining it
    pub retain_association_log: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sequence_start: 1,
            retain_association_log: false,
        }
    }
}

/// One underlying-store session: tracking state, committed-state reads, and
/// the save boundary.
///
/// Sessions are single-threaded-affine: one unit of work owns one session
/// and every arrangement pass runs to completion on that thread. Only the
/// save boundary has an asynchronous counterpart.
#[async_trait]
pub trait StoreSession: Send {
    /// Current tracking state of an entity
    fn entity_state(&self, entity: &dyn Entity) -> EntityState;

    /// Set the tracking state of an entity, snapshotting its field map
    fn set_entity_state(&mut self, entity: &dyn Entity, state: EntityState) -> OrmResult<()>;

    /// Queue a brand-new entity for insertion, assigning its surrogate id
    /// from the type's sequence when the id is default
    fn insert(&mut self, entity: &mut dyn Entity) -> OrmResult<()>;

    /// Mark an entity's persisted row for removal
    fn remove(&mut self, entity: &dyn Entity) -> OrmResult<()>;

    /// Last-committed foreign-key value of a scalar reference; `None` when
    /// the row or value is absent
    fn reference_id(&self, entity: &dyn Entity, reference: &str) -> OrmResult<Option<EntityId>>;

    /// Record a scalar-association transition, applied at save
    fn record_association_change(
        &mut self,
        entity: &dyn Entity,
        reference: &str,
        change: AssociationChange,
    ) -> OrmResult<()>;

    /// Transitions recorded for one reference of one entity
    fn association_changes(&self, _entity: &dyn Entity, _reference: &str) -> Vec<AssociationChange> {
        Vec::new()
    }

    /// Committed children of an owned collection, matched through the
    /// child-side parent back-reference
    fn load_children(
        &self,
        parent: &dyn Entity,
        child_type: &str,
        parent_reference: &str,
    ) -> OrmResult<Vec<Box<dyn Entity>>>;

    /// Committed target of a scalar reference
    fn load_reference(
        &self,
        entity: &dyn Entity,
        reference: &str,
    ) -> OrmResult<Option<Box<dyn Entity>>>;

    /// Fetch a committed row by id
    fn find(&self, entity_type: &str, id: EntityId) -> OrmResult<Option<Box<dyn Entity>>>;

    /// Fetch a batch of committed rows by id list; missing ids are skipped
    fn find_many(&self, entity_type: &str, ids: &[EntityId]) -> OrmResult<Vec<Box<dyn Entity>>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.find(entity_type, *id)? {
                found.push(entity);
            }
        }
        Ok(found)
    }

    /// All committed rows of a type
    fn query(&self, entity_type: &str) -> OrmResult<Vec<Box<dyn Entity>>>;

    /// Apply every pending change durably; returns the number of affected
    /// entities
    fn save_changes(&mut self) -> OrmResult<usize>;

    /// Asynchronous counterpart of [`StoreSession::save_changes`]
    async fn save_changes_async(&mut self) -> OrmResult<usize> {
        self.save_changes()
    }
}
