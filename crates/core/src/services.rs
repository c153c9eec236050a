//! Typed service registry for optional runtime services
//!
//! Services are keyed by their concrete value type. Registering an
//! `Arc<dyn SomeHook>` makes it resolvable as exactly that type; absence of
//! a registration is not an error, callers treat `None` as a no-op.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

/// Thread-safe type-keyed service map.
///
/// One instance is typically shared (behind an `Arc`) between the service
/// layer and application wiring code. Values must be cloneable so resolution
/// hands out an owned handle; `Arc<dyn Trait>` satisfies this naturally.
#[derive(Default)]
pub struct ServiceMap {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceMap {
    /// Create an empty service map
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service under its concrete type, replacing any previous one
    pub fn register<T: Clone + Send + Sync + 'static>(&self, service: T) {
        debug!(service = std::any::type_name::<T>(), "registering service");
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// Resolve a service by type; `None` when nothing is registered
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        let entry = self.services.get(&TypeId::of::<T>())?;
        let arc = Arc::clone(entry.value());
        arc.downcast::<T>().ok().map(|typed| (*typed).clone())
    }

    /// Check whether a service of the given type is registered
    pub fn contains<T: Clone + Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Remove a registration, returning whether one existed
    pub fn remove<T: Clone + Send + Sync + 'static>(&self) -> bool {
        self.services.remove(&TypeId::of::<T>()).is_some()
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the map holds no services
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMap")
            .field("registered", &self.services.len())
            .finish()
    }
}
