//! Repository - per-entity-type CRUD and query access
//!
//! Repositories are transient handles borrowed from a unit of work. They
//! own no relationship logic; arrangement belongs to the relationship
//! managers.

use std::marker::PhantomData;

use crate::entity::{Entity, EntityDef, EntityId};
use crate::error::{OrmError, OrmResult};
use crate::metadata::EntityRegistry;
use crate::query::{compare_values, Filter, OrderBy, OrderDirection, Page, Pagination};
use crate::store::{EntityState, StoreSession};

/// CRUD and query access for one entity type
pub struct Repository<'a, T: EntityDef> {
    session: &'a mut dyn StoreSession,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: EntityDef> Repository<'a, T> {
    /// Create a repository over the given session
    pub fn new(session: &'a mut dyn StoreSession) -> Self {
        Self {
            session,
            _marker: PhantomData,
        }
    }

    fn downcast(entity: Box<dyn Entity>) -> OrmResult<T> {
        entity
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                OrmError::Serialization(format!(
                    "stored entity does not match type '{}'",
                    T::entity_name()
                ))
            })
    }

    /// Fetch an entity by id; `None` when the row is absent
    pub fn find(&self, id: EntityId) -> OrmResult<Option<T>> {
        self.session
            .find(T::entity_name(), id)?
            .map(Self::downcast)
            .transpose()
    }

    /// Fetch an entity by id or fail with a not-found error
    pub fn find_or_fail(&self, id: EntityId) -> OrmResult<T> {
        self.find(id)?
            .ok_or_else(|| OrmError::NotFound(format!("{}({})", T::entity_name(), id)))
    }

    /// All committed entities of this type
    pub fn all(&self) -> OrmResult<Vec<T>> {
        self.session
            .query(T::entity_name())?
            .into_iter()
            .map(Self::downcast)
            .collect()
    }

    /// Filtered, ordered, paged query over committed entities
    pub fn list(
        &self,
        filters: &[Filter],
        order: Option<&OrderBy>,
        pagination: Option<Pagination>,
    ) -> OrmResult<Page<T>> {
        let descriptor = EntityRegistry::global().descriptor(T::entity_name())?;

        let mut rows = Vec::new();
        for entity in self.session.query(T::entity_name())? {
            let fields = descriptor.to_field_map(entity.as_ref())?;
            if filters.iter().all(|filter| filter.matches(&fields)) {
                rows.push((fields, entity));
            }
        }

        if let Some(order) = order {
            rows.sort_by(|(a, _), (b, _)| {
                let null = serde_json::Value::Null;
                let left = a.get(order.field.as_str()).unwrap_or(&null);
                let right = b.get(order.field.as_str()).unwrap_or(&null);
                let ordering = compare_values(left, right).unwrap_or(std::cmp::Ordering::Equal);
                match order.direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                }
            });
        }

        let total = rows.len();
        let pagination = pagination.unwrap_or_default();
        let items = rows
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.per_page)
            .map(|(_, entity)| Self::downcast(entity))
            .collect::<OrmResult<Vec<T>>>()?;

        Ok(Page {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        })
    }

    /// Queue a brand-new entity for insertion; its id is assigned here
    pub fn add(&mut self, entity: &mut T) -> OrmResult<()> {
        self.session.insert(entity)
    }

    /// Mark a persisted entity as modified
    pub fn update(&mut self, entity: &T) -> OrmResult<()> {
        if !entity.id().is_persisted() {
            return Err(OrmError::State(format!(
                "cannot update unsaved {}",
                T::entity_name()
            )));
        }
        self.session.set_entity_state(entity, EntityState::Modified)
    }

    /// Mark a persisted entity for removal
    pub fn remove(&mut self, entity: &T) -> OrmResult<()> {
        self.session.remove(entity)
    }
}
