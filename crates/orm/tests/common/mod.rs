//! Shared fixture entities: an order aggregate with owned lines, a plain
//! customer/product lookup side, and a non-owned tag collection.

#![allow(dead_code)]

use std::any::Any;

use serde::{Deserialize, Serialize};

use arbor_orm::{
    Children, CollectionAccessor, CollectionDescriptor, Entity, EntityDef, EntityDescriptor,
    EntityId, EntityRegistry, Reference, ReferenceAccessor, ReferenceDescriptor,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
}

impl Entity for Customer {
    fn entity_type(&self) -> &'static str {
        "Customer"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for Customer {
    fn entity_name() -> &'static str {
        "Customer"
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new::<Customer>("Customer")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
}

impl Entity for Product {
    fn entity_type(&self) -> &'static str {
        "Product"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for Product {
    fn entity_name() -> &'static str {
        "Product"
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new::<Product>("Product")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub label: String,
}

impl Entity for Tag {
    fn entity_type(&self) -> &'static str {
        "Tag"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for Tag {
    fn entity_name() -> &'static str {
        "Tag"
    }

    fn descriptor() -> EntityDescriptor {
        // no parent back-reference: tags are never owned by an order
        EntityDescriptor::new::<Tag>("Tag")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    pub number: String,
    pub customer: Reference<Customer>,
    pub lines: Children<OrderLine>,
    pub tags: Children<Tag>,
}

impl Entity for Order {
    fn entity_type(&self) -> &'static str {
        "Order"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for Order {
    fn entity_name() -> &'static str {
        "Order"
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new::<Order>("Order")
            .aggregate_root()
            .with_reference(ReferenceDescriptor::new(
                "customer",
                "Customer",
                ReferenceAccessor::of::<Order, Customer, _, _>(
                    |o| &o.customer,
                    |o| &mut o.customer,
                ),
            ))
            .with_collection(CollectionDescriptor::new(
                "lines",
                "OrderLine",
                CollectionAccessor::of::<Order, OrderLine, _, _>(|o| &o.lines, |o| &mut o.lines),
            ))
            .with_collection(CollectionDescriptor::new(
                "tags",
                "Tag",
                CollectionAccessor::of::<Order, Tag, _, _>(|o| &o.tags, |o| &mut o.tags),
            ))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: EntityId,
    pub sku: String,
    pub quantity: i64,
    pub order: Reference<Order>,
    pub product: Reference<Product>,
}

impl Entity for OrderLine {
    fn entity_type(&self) -> &'static str {
        "OrderLine"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl EntityDef for OrderLine {
    fn entity_name() -> &'static str {
        "OrderLine"
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new::<OrderLine>("OrderLine")
            .with_reference(
                ReferenceDescriptor::new(
                    "order",
                    "Order",
                    ReferenceAccessor::of::<OrderLine, Order, _, _>(
                        |l| &l.order,
                        |l| &mut l.order,
                    ),
                )
                .parent(),
            )
            .with_reference(ReferenceDescriptor::new(
                "product",
                "Product",
                ReferenceAccessor::of::<OrderLine, Product, _, _>(
                    |l| &l.product,
                    |l| &mut l.product,
                ),
            ))
    }
}

/// Register every fixture type; safe to call from each test
pub fn register_fixtures() {
    let registry = EntityRegistry::global();
    registry.register::<Customer>().unwrap();
    registry.register::<Product>().unwrap();
    registry.register::<Tag>().unwrap();
    registry.register::<Order>().unwrap();
    registry.register::<OrderLine>().unwrap();
}

/// A new, unsaved line
pub fn line(sku: &str, quantity: i64) -> OrderLine {
    OrderLine {
        sku: sku.to_string(),
        quantity,
        ..OrderLine::default()
    }
}

/// A new, unsaved order with the given lines
pub fn order_with_lines(number: &str, lines: Vec<OrderLine>) -> Order {
    Order {
        number: number.to_string(),
        lines: Children::from_vec(lines),
        ..Order::default()
    }
}
