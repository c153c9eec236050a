//! Service-layer use cases end to end: validation before mutation, hook
//! resolution, eager-loaded reads, and paged lists.

mod common;

use std::sync::Arc;

use arbor_core::ServiceMap;
use arbor_validation::{EntityValidator, RequiredRule};

use arbor_orm::{
    CrudService, Entity, EntityId, Filter, MemorySession, MemoryStore, OrderBy, OrmResult,
    Pagination, RelatedEntitiesCreator, ServiceError, StoreSession,
};

use common::{line, order_with_lines, register_fixtures, Customer, Order};

fn service_over(
    store: &MemoryStore,
    services: Arc<ServiceMap>,
) -> CrudService<Order, MemorySession> {
    let factory_store = store.clone();
    CrudService::new(
        move || MemorySession::with_store(factory_store.clone()),
        services,
    )
}

fn seed_customer(store: &MemoryStore, name: &str) -> EntityId {
    let mut session = MemorySession::with_store(store.clone());
    let mut customer = Customer {
        name: name.to_string(),
        ..Customer::default()
    };
    session.insert(&mut customer).unwrap();
    session.save_changes().unwrap();
    customer.id
}

#[test]
fn validation_failures_are_collected_before_any_store_mutation() {
    register_fixtures();
    let store = MemoryStore::new();
    let service = service_over(&store, Arc::new(ServiceMap::new()))
        .with_validator(EntityValidator::new().rule("number", RequiredRule));

    let result = service.create(order_with_lines("", vec![line("A", 1)]));

    match result {
        Err(ServiceError::Validation(errors)) => {
            assert!(errors.has_field_errors("number"));
        }
        Err(other) => panic!("expected validation error, got {}", other),
        Ok(_) => panic!("expected validation error, got success"),
    }

    // nothing reached the store
    assert_eq!(store.committed_count("Order"), 0);
    assert_eq!(store.committed_count("OrderLine"), 0);
}

#[test]
fn create_then_get_returns_an_eager_loaded_aggregate() {
    register_fixtures();
    let store = MemoryStore::new();
    let customer_id = seed_customer(&store, "Ada");
    let service = service_over(&store, Arc::new(ServiceMap::new()));

    let mut order = order_with_lines("ORD-100", vec![line("A", 1), line("B", 2)]);
    order.customer.set_target_id(Some(customer_id));

    let created = service.create(order).unwrap();
    assert!(created.id.is_persisted());
    assert_eq!(created.lines.len(), 2);
    assert_eq!(store.committed_count("OrderLine"), 2);

    let loaded = service.get(created.id).unwrap().unwrap();
    assert_eq!(loaded.number, "ORD-100");
    assert_eq!(loaded.lines.len(), 2);
    let customer = loaded.customer.get().expect("customer eager-loaded");
    assert_eq!(customer.name, "Ada");
}

#[test]
fn missing_id_reads_as_none() {
    register_fixtures();
    let store = MemoryStore::new();
    let service = service_over(&store, Arc::new(ServiceMap::new()));

    assert!(service.get(EntityId::new(9999)).unwrap().is_none());
}

struct ExtraLineHook;

impl RelatedEntitiesCreator<Order> for ExtraLineHook {
    fn create_related(&self, session: &mut dyn StoreSession, entity: &mut Order) -> OrmResult<()> {
        let mut extra = line("HOOKED", 1);
        extra.order.set_target_id(Some(entity.id()));
        session.insert(&mut extra)?;
        entity.lines.push(extra);
        Ok(())
    }
}

#[test]
fn registered_creation_hook_runs_after_arrangement() {
    register_fixtures();
    let store = MemoryStore::new();

    let services = Arc::new(ServiceMap::new());
    let hook: Arc<dyn RelatedEntitiesCreator<Order>> = Arc::new(ExtraLineHook);
    services.register(hook);

    let service = service_over(&store, services);
    let created = service
        .create(order_with_lines("ORD-200", vec![line("A", 1)]))
        .unwrap();

    assert_eq!(store.committed_count("OrderLine"), 2);
    assert!(created.lines.iter().any(|l| l.sku == "HOOKED"));
}

#[test]
fn absent_hook_registration_is_a_no_op() {
    register_fixtures();
    let store = MemoryStore::new();
    let service = service_over(&store, Arc::new(ServiceMap::new()));

    let created = service
        .create(order_with_lines("ORD-201", vec![line("A", 1)]))
        .unwrap();
    assert_eq!(created.lines.len(), 1);
}

#[test]
fn update_reconciles_the_aggregate() {
    register_fixtures();
    let store = MemoryStore::new();
    let service = service_over(&store, Arc::new(ServiceMap::new()));

    let created = service
        .create(order_with_lines("ORD-300", vec![line("A", 1), line("B", 2)]))
        .unwrap();
    let dropped = created.lines.as_slice()[0].id;

    let mut edited = service.get(created.id).unwrap().unwrap();
    edited.number = "ORD-300-R1".to_string();
    edited.lines.retain(|l| l.id != dropped);
    edited.lines.push(line("C", 3));

    let updated = service.update(edited).unwrap();
    assert_eq!(updated.lines.len(), 2);

    let reloaded = service.get(created.id).unwrap().unwrap();
    assert_eq!(reloaded.number, "ORD-300-R1");
    assert_eq!(reloaded.lines.len(), 2);
    assert!(reloaded.lines.iter().all(|l| l.id != dropped));
    assert!(reloaded.lines.iter().any(|l| l.sku == "C"));
}

#[test]
fn delete_cascades_and_reports_missing_ids() {
    register_fixtures();
    let store = MemoryStore::new();
    let service = service_over(&store, Arc::new(ServiceMap::new()));

    let created = service
        .create(order_with_lines("ORD-400", vec![line("A", 1), line("B", 1)]))
        .unwrap();
    assert_eq!(store.committed_count("OrderLine"), 2);

    assert!(service.delete(created.id).unwrap());
    assert_eq!(store.committed_count("Order"), 0);
    assert_eq!(store.committed_count("OrderLine"), 0);

    // a second delete finds nothing
    assert!(!service.delete(created.id).unwrap());
}

#[test]
fn list_filters_orders_and_pages() {
    register_fixtures();
    let store = MemoryStore::new();
    let service = service_over(&store, Arc::new(ServiceMap::new()));

    for number in ["ORD-501", "ORD-502", "ORD-503", "MISC-1"] {
        service.create(order_with_lines(number, vec![])).unwrap();
    }

    let page = service
        .list(
            &[Filter::contains("number", "ORD-5")],
            Some(&OrderBy::desc("number")),
            Some(Pagination::new(1, 2)),
        )
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].number, "ORD-503");
    assert_eq!(page.items[1].number, "ORD-502");
}
