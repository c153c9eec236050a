//! Property accessors for registered entity metadata
//!
//! Accessors replace reflection: each registered reference or collection
//! property carries a closure bundle that reads and writes the property
//! through `dyn Any`, downcasting to the concrete entity type internally.
//! A failed downcast behaves as an absent value; descriptor/entity type
//! agreement is checked once per arrangement pass before accessors run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::entity::{Children, Entity, EntityId, Reference};

/// Closure bundle for one scalar reference property
#[derive(Clone)]
pub struct ReferenceAccessor {
    /// Borrow the loaded target entity
    pub get: Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Entity> + Send + Sync>,
    /// Mutably borrow the loaded target entity
    pub get_mut: Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Entity> + Send + Sync>,
    /// Read the in-memory target id
    pub target_id: Arc<dyn Fn(&dyn Any) -> Option<EntityId> + Send + Sync>,
    /// Overwrite the scalar target id
    pub set_target_id: Arc<dyn Fn(&mut dyn Any, Option<EntityId>) + Send + Sync>,
    /// Drop the loaded target while keeping the scalar id
    pub detach: Arc<dyn Fn(&mut dyn Any) + Send + Sync>,
    /// Install a loaded target (read-path eager loading)
    pub install: Arc<dyn Fn(&mut dyn Any, Box<dyn Entity>) + Send + Sync>,
}

impl ReferenceAccessor {
    /// Build an accessor from a pair of field projections.
    ///
    /// The projections must be capture-free closures (`|e| &e.field` /
    /// `|e| &mut e.field`) so they can be shared across the closure bundle.
    pub fn of<E, T, G, M>(get: G, get_mut: M) -> Self
    where
        E: Entity + 'static,
        T: Entity + 'static,
        G: Fn(&E) -> &Reference<T> + Copy + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut Reference<T> + Copy + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(move |any: &dyn Any| -> Option<&dyn Entity> {
                any.downcast_ref::<E>()
                    .and_then(|entity| get(entity).get())
                    .map(|target| target as &dyn Entity)
            }),
            get_mut: Arc::new(move |any: &mut dyn Any| -> Option<&mut dyn Entity> {
                any.downcast_mut::<E>()
                    .and_then(|entity| get_mut(entity).get_mut())
                    .map(|target| target as &mut dyn Entity)
            }),
            target_id: Arc::new(move |any: &dyn Any| {
                any.downcast_ref::<E>()
                    .and_then(|entity| get(entity).target_id())
            }),
            set_target_id: Arc::new(move |any: &mut dyn Any, id: Option<EntityId>| {
                if let Some(entity) = any.downcast_mut::<E>() {
                    get_mut(entity).set_target_id(id);
                }
            }),
            detach: Arc::new(move |any: &mut dyn Any| {
                if let Some(entity) = any.downcast_mut::<E>() {
                    get_mut(entity).detach();
                }
            }),
            install: Arc::new(move |any: &mut dyn Any, target: Box<dyn Entity>| {
                if let Some(entity) = any.downcast_mut::<E>() {
                    if let Ok(typed) = target.into_any().downcast::<T>() {
                        get_mut(entity).set_boxed(typed);
                    }
                }
            }),
        }
    }
}

impl fmt::Debug for ReferenceAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReferenceAccessor")
    }
}

/// Closure bundle for one collection property
#[derive(Clone)]
pub struct CollectionAccessor {
    /// Strip the collection off the entity, boxing each element
    pub take: Arc<dyn Fn(&mut dyn Any) -> Option<Vec<Box<dyn Entity>>> + Send + Sync>,
    /// Re-attach a collection value, downcasting each element
    pub restore: Arc<dyn Fn(&mut dyn Any, Vec<Box<dyn Entity>>) + Send + Sync>,
    /// Whether the collection is materialized in memory
    pub is_loaded: Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>,
}

impl CollectionAccessor {
    /// Build an accessor from a pair of field projections
    pub fn of<E, T, G, M>(get: G, get_mut: M) -> Self
    where
        E: Entity + 'static,
        T: Entity + 'static,
        G: Fn(&E) -> &Children<T> + Copy + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut Children<T> + Copy + Send + Sync + 'static,
    {
        Self {
            take: Arc::new(move |any: &mut dyn Any| {
                any.downcast_mut::<E>()
                    .and_then(|entity| get_mut(entity).take_all())
                    .map(|items| {
                        items
                            .into_iter()
                            .map(|child| Box::new(child) as Box<dyn Entity>)
                            .collect()
                    })
            }),
            restore: Arc::new(move |any: &mut dyn Any, items: Vec<Box<dyn Entity>>| {
                if let Some(entity) = any.downcast_mut::<E>() {
                    let mut typed = Vec::with_capacity(items.len());
                    for item in items {
                        if let Ok(child) = item.into_any().downcast::<T>() {
                            typed.push(*child);
                        }
                    }
                    get_mut(entity).set_all(typed);
                }
            }),
            is_loaded: Arc::new(move |any: &dyn Any| {
                any.downcast_ref::<E>()
                    .map(|entity| get(entity).is_loaded())
                    .unwrap_or(false)
            }),
        }
    }
}

impl fmt::Debug for CollectionAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CollectionAccessor")
    }
}
