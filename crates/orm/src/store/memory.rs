//! In-memory store
//!
//! `MemoryStore` is the shared committed state: generic field-map rows keyed
//! by surrogate id, plus per-type id sequences. `MemorySession` implements
//! [`StoreSession`] over a store handle; pending work lives in the session's
//! tracked-entry table and scalar-association log, invisible to reads until
//! `save_changes`. Cloning the store clones the handle, so a session factory
//! can open any number of sessions over the same data.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::entity::{Entity, EntityId};
use crate::error::{OrmError, OrmResult};
use crate::metadata::EntityRegistry;
use crate::store::{AssociationChange, EntityKey, EntityState, SessionConfig, StoreSession};

type Rows = HashMap<String, BTreeMap<EntityId, Map<String, Value>>>;

/// Shared committed state behind cheap clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Rows>>,
    sequences: Arc<RwLock<HashMap<String, i64>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows of a type
    pub fn committed_count(&self, entity_type: &str) -> usize {
        self.committed
            .read()
            .map(|rows| rows.get(entity_type).map(|r| r.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    fn read(&self) -> OrmResult<RwLockReadGuard<'_, Rows>> {
        self.committed
            .read()
            .map_err(|_| OrmError::Connection("store lock poisoned".to_string()))
    }

    fn write(&self) -> OrmResult<RwLockWriteGuard<'_, Rows>> {
        self.committed
            .write()
            .map_err(|_| OrmError::Connection("store lock poisoned".to_string()))
    }

    fn next_id(&self, entity_type: &str, start: i64) -> OrmResult<EntityId> {
        let committed = self.read()?;
        let mut sequences = self
            .sequences
            .write()
            .map_err(|_| OrmError::Connection("store lock poisoned".to_string()))?;
        let sequence = sequences.entry(entity_type.to_string()).or_insert(start);
        let mut candidate = *sequence;
        if let Some(rows) = committed.get(entity_type) {
            while rows.contains_key(&EntityId::new(candidate)) {
                candidate += 1;
            }
        }
        *sequence = candidate + 1;
        Ok(EntityId::new(candidate))
    }

    fn bump_sequence(&self, entity_type: &str, id: EntityId, start: i64) -> OrmResult<()> {
        let mut sequences = self
            .sequences
            .write()
            .map_err(|_| OrmError::Connection("store lock poisoned".to_string()))?;
        let sequence = sequences.entry(entity_type.to_string()).or_insert(start);
        if id.raw() >= *sequence {
            *sequence = id.raw() + 1;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    state: EntityState,
    fields: Map<String, Value>,
}

/// Embedded in-process store session
#[derive(Debug, Default)]
pub struct MemorySession {
    store: MemoryStore,
    config: SessionConfig,
    tracked: HashMap<EntityKey, TrackedEntry>,
    association_log: HashMap<(EntityKey, String), Vec<AssociationChange>>,
}

impl MemorySession {
    /// Create a session over its own private store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session over a shared store
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Create a session with the given options
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The backing store handle
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Number of committed rows of a type
    pub fn committed_count(&self, entity_type: &str) -> usize {
        self.store.committed_count(entity_type)
    }

    /// Number of tracked (pending) entries
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    fn snapshot(&self, entity: &dyn Entity) -> OrmResult<Map<String, Value>> {
        let descriptor = EntityRegistry::global().descriptor_of(entity)?;
        descriptor.to_field_map(entity)
    }

    fn committed_row(&self, entity_type: &str, id: EntityId) -> OrmResult<Option<Map<String, Value>>> {
        Ok(self
            .store
            .read()?
            .get(entity_type)
            .and_then(|rows| rows.get(&id))
            .cloned())
    }

    fn require_reference(&self, entity_type: &str, reference: &str) -> OrmResult<()> {
        let descriptor = EntityRegistry::global().descriptor(entity_type)?;
        if descriptor.reference(reference).is_none() {
            return Err(OrmError::Configuration(format!(
                "entity '{}' has no registered reference '{}'",
                entity_type, reference
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    fn entity_state(&self, entity: &dyn Entity) -> EntityState {
        if !entity.id().is_persisted() {
            return EntityState::Detached;
        }
        self.tracked
            .get(&EntityKey::of(entity))
            .map(|entry| entry.state)
            .unwrap_or(EntityState::Detached)
    }

    fn set_entity_state(&mut self, entity: &dyn Entity, state: EntityState) -> OrmResult<()> {
        if state == EntityState::Detached {
            self.tracked.remove(&EntityKey::of(entity));
            return Ok(());
        }
        if !entity.id().is_persisted() {
            return Err(OrmError::State(format!(
                "cannot track unsaved {} as {:?}; use insert for new entities",
                entity.entity_type(),
                state
            )));
        }
        let fields = self.snapshot(entity)?;
        self.tracked
            .insert(EntityKey::of(entity), TrackedEntry { state, fields });
        Ok(())
    }

    fn insert(&mut self, entity: &mut dyn Entity) -> OrmResult<()> {
        // validates registration before any state is touched
        let _ = EntityRegistry::global().descriptor_of(entity)?;

        if entity.id().is_persisted() {
            let key = EntityKey::of(entity);
            if self.committed_row(&key.entity_type, key.id)?.is_some()
                || self.tracked.contains_key(&key)
            {
                return Err(OrmError::State(format!("duplicate insert for {}", key)));
            }
            self.store
                .bump_sequence(entity.entity_type(), entity.id(), self.config.sequence_start)?;
        } else {
            let id = self
                .store
                .next_id(entity.entity_type(), self.config.sequence_start)?;
            entity.set_id(id);
        }

        let fields = self.snapshot(entity)?;
        debug!(
            entity_type = entity.entity_type(),
            id = entity.id().raw(),
            "queued insert"
        );
        self.tracked.insert(
            EntityKey::of(entity),
            TrackedEntry {
                state: EntityState::Added,
                fields,
            },
        );
        Ok(())
    }

    fn remove(&mut self, entity: &dyn Entity) -> OrmResult<()> {
        let key = EntityKey::of(entity);
        if let Some(entry) = self.tracked.get(&key) {
            if entry.state == EntityState::Added {
                // removing a pending insert just cancels it
                self.tracked.remove(&key);
                return Ok(());
            }
        }
        if !entity.id().is_persisted() {
            return Err(OrmError::State(format!(
                "cannot remove unsaved {}",
                entity.entity_type()
            )));
        }
        let fields = self.snapshot(entity)?;
        debug!(
            entity_type = entity.entity_type(),
            id = entity.id().raw(),
            "queued removal"
        );
        self.tracked.insert(
            key,
            TrackedEntry {
                state: EntityState::Deleted,
                fields,
            },
        );
        Ok(())
    }

    fn reference_id(&self, entity: &dyn Entity, reference: &str) -> OrmResult<Option<EntityId>> {
        self.require_reference(entity.entity_type(), reference)?;
        let id = self
            .committed_row(entity.entity_type(), entity.id())?
            .and_then(|row| row.get(reference).cloned())
            .and_then(|value| value.as_i64())
            .map(EntityId::new)
            .filter(|id| id.is_persisted());
        Ok(id)
    }

    fn record_association_change(
        &mut self,
        entity: &dyn Entity,
        reference: &str,
        change: AssociationChange,
    ) -> OrmResult<()> {
        self.require_reference(entity.entity_type(), reference)?;
        debug!(
            entity_type = entity.entity_type(),
            id = entity.id().raw(),
            reference,
            change = ?change,
            "recorded association change"
        );
        self.association_log
            .entry((EntityKey::of(entity), reference.to_string()))
            .or_default()
            .push(change);
        Ok(())
    }

    fn association_changes(&self, entity: &dyn Entity, reference: &str) -> Vec<AssociationChange> {
        self.association_log
            .get(&(EntityKey::of(entity), reference.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn load_children(
        &self,
        parent: &dyn Entity,
        child_type: &str,
        parent_reference: &str,
    ) -> OrmResult<Vec<Box<dyn Entity>>> {
        let child_descriptor = EntityRegistry::global().descriptor(child_type)?;
        self.require_reference(child_type, parent_reference)?;

        let parent_id = parent.id().raw();
        let committed = self.store.read()?;
        let mut children = Vec::new();
        if let Some(rows) = committed.get(child_type) {
            for row in rows.values() {
                let matches = row
                    .get(parent_reference)
                    .and_then(Value::as_i64)
                    .map(|id| id == parent_id)
                    .unwrap_or(false);
                if matches {
                    children.push(child_descriptor.from_field_map(row)?);
                }
            }
        }
        Ok(children)
    }

    fn load_reference(
        &self,
        entity: &dyn Entity,
        reference: &str,
    ) -> OrmResult<Option<Box<dyn Entity>>> {
        let descriptor = EntityRegistry::global().descriptor_of(entity)?;
        let target_type = descriptor
            .reference(reference)
            .map(|r| r.target_type)
            .ok_or_else(|| {
                OrmError::Configuration(format!(
                    "entity '{}' has no registered reference '{}'",
                    descriptor.name, reference
                ))
            })?;
        match self.reference_id(entity, reference)? {
            Some(id) => self.find(target_type, id),
            None => Ok(None),
        }
    }

    fn find(&self, entity_type: &str, id: EntityId) -> OrmResult<Option<Box<dyn Entity>>> {
        let descriptor = EntityRegistry::global().descriptor(entity_type)?;
        self.committed_row(entity_type, id)?
            .map(|row| descriptor.from_field_map(&row))
            .transpose()
    }

    fn query(&self, entity_type: &str) -> OrmResult<Vec<Box<dyn Entity>>> {
        let descriptor = EntityRegistry::global().descriptor(entity_type)?;
        let committed = self.store.read()?;
        let mut entities = Vec::new();
        if let Some(rows) = committed.get(entity_type) {
            for row in rows.values() {
                entities.push(descriptor.from_field_map(row)?);
            }
        }
        Ok(entities)
    }

    fn save_changes(&mut self) -> OrmResult<usize> {
        let tracked = std::mem::take(&mut self.tracked);
        let mut affected = 0;

        {
            let mut committed = self.store.write()?;
            for (key, entry) in tracked {
                let rows = committed.entry(key.entity_type.clone()).or_default();
                match entry.state {
                    EntityState::Added | EntityState::Modified => {
                        rows.insert(key.id, entry.fields);
                        affected += 1;
                    }
                    EntityState::Deleted => {
                        if rows.remove(&key.id).is_none() {
                            warn!(key = %key, "removal of a row that no longer exists");
                        }
                        affected += 1;
                    }
                    EntityState::Unchanged | EntityState::Detached => {}
                }
            }

            let log = std::mem::take(&mut self.association_log);
            for ((key, reference), changes) in &log {
                let Some(change) = changes.last() else {
                    continue;
                };
                let row = committed
                    .get_mut(&key.entity_type)
                    .and_then(|rows| rows.get_mut(&key.id));
                let Some(row) = row else {
                    warn!(key = %key, reference, "association change for a missing row");
                    continue;
                };
                let value = match change {
                    AssociationChange::Added(id) => Value::from(id.raw()),
                    AssociationChange::Removed(_) => Value::Null,
                };
                row.insert(reference.clone(), value);
            }
            if self.config.retain_association_log {
                self.association_log = log;
            }
        }

        debug!(affected, "saved changes");
        Ok(affected)
    }
}
