//! CRUD service - create/update/delete/read use cases
//!
//! Each use case runs inside its own unit of work: validate, apply the
//! repository operation, arrange relationships for the life-cycle event,
//! run registered hooks, save once, then restore stripped references.
//! Validation failures are collected exhaustively and returned before any
//! store mutation; the unit of work is released on every exit path by RAII.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use arbor_core::ServiceMap;
use arbor_validation::{EntityValidator, ValidateFields};

use crate::entity::{Entity, EntityDef, EntityId};
use crate::events::{DomainEvent, EntityEvent};
use crate::hooks;
use crate::metadata::EntityRegistry;
use crate::query::{Filter, OrderBy, Page, Pagination};
use crate::services::{ServiceError, ServiceResult};
use crate::store::StoreSession;
use crate::unit_of_work::UnitOfWork;

/// Use-case orchestration for one entity type
pub struct CrudService<T: EntityDef, S: StoreSession> {
    session_factory: Arc<dyn Fn() -> S + Send + Sync>,
    services: Arc<ServiceMap>,
    validator: Option<EntityValidator>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: EntityDef, S: StoreSession> CrudService<T, S> {
    /// Create a service; each use case opens a fresh session from the
    /// factory
    pub fn new(
        session_factory: impl Fn() -> S + Send + Sync + 'static,
        services: Arc<ServiceMap>,
    ) -> Self {
        Self {
            session_factory: Arc::new(session_factory),
            services,
            validator: None,
            _marker: PhantomData,
        }
    }

    /// Attach a validator run before create and update
    pub fn with_validator(mut self, validator: EntityValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    fn open(&self) -> UnitOfWork<S> {
        UnitOfWork::new((self.session_factory)())
    }

    fn validate(&self, entity: &T) -> ServiceResult<()> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let descriptor = EntityRegistry::global()
            .descriptor(T::entity_name())
            .map_err(ServiceError::Orm)?;
        let fields = descriptor
            .to_field_map(entity)
            .map_err(ServiceError::Orm)?;
        validator.validate_fields(&fields)?;
        Ok(())
    }

    /// Create an entity and its owned children
    pub fn create(&self, mut entity: T) -> ServiceResult<T> {
        self.validate(&entity)?;

        let mut uow = self.open();
        {
            let mut repository = uow.repository::<T>()?;
            repository.add(&mut entity)?;
        }

        let mut manager = uow.relationship_manager(DomainEvent::Created)?;
        manager.prepare_relationships(uow.session_mut()?, &mut entity)?;
        hooks::run_related_creator(&self.services, uow.session_mut()?, &mut entity)?;

        uow.record_event(EntityEvent::new(DomainEvent::Created, &entity));
        uow.save_changes()?;
        manager.restore_references(&mut entity);

        debug!(
            entity_type = T::entity_name(),
            id = entity.id().raw(),
            "created"
        );
        Ok(entity)
    }

    /// Update an entity, reconciling its references and owned children
    pub fn update(&self, mut entity: T) -> ServiceResult<T> {
        self.validate(&entity)?;

        let mut uow = self.open();
        {
            let mut repository = uow.repository::<T>()?;
            repository.update(&entity)?;
        }

        let mut manager = uow.relationship_manager(DomainEvent::Updated)?;
        manager.prepare_relationships(uow.session_mut()?, &mut entity)?;
        hooks::run_related_updater(&self.services, uow.session_mut()?, &mut entity)?;

        uow.record_event(EntityEvent::new(DomainEvent::Updated, &entity));
        uow.save_changes()?;
        manager.restore_references(&mut entity);

        debug!(
            entity_type = T::entity_name(),
            id = entity.id().raw(),
            "updated"
        );
        Ok(entity)
    }

    /// Delete an entity and cascade to its owned children; `false` when the
    /// id no longer exists
    pub fn delete(&self, id: EntityId) -> ServiceResult<bool> {
        let mut uow = self.open();

        let Some(mut entity) = uow.repository::<T>()?.find(id)? else {
            return Ok(false);
        };

        let mut manager = uow.relationship_manager(DomainEvent::Deleted)?;
        manager.prepare_relationships(uow.session_mut()?, &mut entity)?;

        {
            let mut repository = uow.repository::<T>()?;
            repository.remove(&entity)?;
        }

        uow.record_event(EntityEvent::new(DomainEvent::Deleted, &entity));
        uow.save_changes()?;

        debug!(entity_type = T::entity_name(), id = id.raw(), "deleted");
        Ok(true)
    }

    /// Fetch an entity with its references and owned children eager-loaded
    pub fn get(&self, id: EntityId) -> ServiceResult<Option<T>> {
        let mut uow = self.open();

        let Some(mut entity) = uow.repository::<T>()?.find(id)? else {
            return Ok(None);
        };
        uow.loader()?.load_graph(&mut entity)?;
        Ok(Some(entity))
    }

    /// Filtered, ordered, paged read
    pub fn list(
        &self,
        filters: &[Filter],
        order: Option<&OrderBy>,
        pagination: Option<Pagination>,
    ) -> ServiceResult<Page<T>> {
        let mut uow = self.open();
        let page = uow.repository::<T>()?.list(filters, order, pagination)?;
        Ok(page)
    }
}
