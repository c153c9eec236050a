//! Navigation containers for scalar references and owned child collections
//!
//! `Reference<T>` models a scalar navigation property: an optional target id
//! plus an optionally loaded target entity. It serializes as the bare
//! foreign-key id so generic field maps carry a plain column.
//!
//! `Children<T>` models an owned child collection. The unloaded state is
//! representable so a collection can be stripped off the live entity during
//! relationship arrangement and re-attached afterwards. It serializes as
//! null; collection contents never travel through field maps.

use serde::de::{Deserializer, IgnoredAny};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::entity::core_trait::Entity;
use crate::entity::identity::EntityId;

/// Scalar navigation property pointing at another entity
#[derive(Debug)]
pub struct Reference<T: Entity> {
    target_id: Option<EntityId>,
    value: Option<Box<T>>,
}

impl<T: Entity> Reference<T> {
    /// An empty reference
    pub fn none() -> Self {
        Self {
            target_id: None,
            value: None,
        }
    }

    /// A reference loaded with the given target
    pub fn to(entity: T) -> Self {
        let mut reference = Self::none();
        reference.set(entity);
        reference
    }

    /// A reference carrying only the target id
    pub fn with_id(id: EntityId) -> Self {
        Self {
            target_id: Some(id).filter(|id| id.is_persisted()),
            value: None,
        }
    }

    /// Borrow the loaded target, if any
    pub fn get(&self) -> Option<&T> {
        self.value.as_deref()
    }

    /// Mutably borrow the loaded target, if any
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_deref_mut()
    }

    /// Point at the given target, replacing any previous one
    pub fn set(&mut self, entity: T) {
        self.set_boxed(Box::new(entity));
    }

    /// Point at the given boxed target, replacing any previous one
    pub fn set_boxed(&mut self, entity: Box<T>) {
        self.target_id = Some(entity.id()).filter(|id| id.is_persisted());
        self.value = Some(entity);
    }

    /// The id of the in-memory target: the loaded entity's persisted id, or
    /// the stored scalar when nothing is loaded
    pub fn target_id(&self) -> Option<EntityId> {
        match &self.value {
            Some(entity) => Some(entity.id()).filter(|id| id.is_persisted()),
            None => self.target_id,
        }
    }

    /// Overwrite the scalar target id; unsaved ids are treated as absent
    pub fn set_target_id(&mut self, id: Option<EntityId>) {
        self.target_id = id.filter(|id| id.is_persisted());
    }

    /// Drop the loaded target while preserving the scalar id
    pub fn detach(&mut self) {
        self.target_id = self.target_id();
        self.value = None;
    }

    /// Clear both the loaded target and the scalar id
    pub fn clear(&mut self) {
        self.target_id = None;
        self.value = None;
    }

    /// Whether the reference points at anything (loaded or by id)
    pub fn is_set(&self) -> bool {
        self.value.is_some() || self.target_id.is_some()
    }

    /// Whether the target entity is loaded in memory
    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// Take the loaded target, preserving the scalar id
    pub fn take(&mut self) -> Option<Box<T>> {
        self.target_id = self.target_id();
        self.value.take()
    }
}

impl<T: Entity> Default for Reference<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T: Entity> Serialize for Reference<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.target_id().serialize(serializer)
    }
}

impl<'de, T: Entity> Deserialize<'de> for Reference<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = Option::<EntityId>::deserialize(deserializer)?;
        Ok(match id {
            Some(id) if id.is_persisted() => Self::with_id(id),
            _ => Self::none(),
        })
    }
}

/// Owned child collection of an aggregate root
#[derive(Debug)]
pub struct Children<T: Entity> {
    items: Option<Vec<T>>,
}

impl<T: Entity> Children<T> {
    /// An empty, loaded collection
    pub fn new() -> Self {
        Self {
            items: Some(Vec::new()),
        }
    }

    /// The unloaded (stripped) state
    pub fn unloaded() -> Self {
        Self { items: None }
    }

    /// A loaded collection with the given children
    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items: Some(items) }
    }

    /// Whether the collection is materialized in memory
    pub fn is_loaded(&self) -> bool {
        self.items.is_some()
    }

    /// Add a child, materializing the collection if needed
    pub fn push(&mut self, child: T) {
        self.items.get_or_insert_with(Vec::new).push(child);
    }

    /// Borrow the children; empty when unloaded
    pub fn as_slice(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }

    /// Mutably borrow the children; empty when unloaded
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.items.as_deref_mut().unwrap_or(&mut [])
    }

    /// Iterate over the children
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Number of children; zero when unloaded
    pub fn len(&self) -> usize {
        self.items.as_ref().map(|v| v.len()).unwrap_or(0)
    }

    /// Whether no children are materialized
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strip the collection, leaving the unloaded state
    pub fn take_all(&mut self) -> Option<Vec<T>> {
        self.items.take()
    }

    /// Re-attach a collection value
    pub fn set_all(&mut self, items: Vec<T>) {
        self.items = Some(items);
    }

    /// Remove every child matching the predicate
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        if let Some(items) = &mut self.items {
            items.retain(keep);
        }
    }
}

impl<T: Entity> Default for Children<T> {
    fn default() -> Self {
        Self::unloaded()
    }
}

impl<T: Entity> Serialize for Children<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_none()
    }
}

impl<'de, T: Entity> Deserialize<'de> for Children<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let _ = IgnoredAny::deserialize(deserializer)?;
        Ok(Self::unloaded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Widget {
        id: EntityId,
        name: String,
    }

    impl Entity for Widget {
        fn entity_type(&self) -> &'static str {
            "Widget"
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

    fn widget(id: i64, name: &str) -> Widget {
        Widget {
            id: EntityId::new(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_reference_target_id_prefers_loaded_entity() {
        let mut reference = Reference::with_id(EntityId::new(3));
        assert_eq!(reference.target_id(), Some(EntityId::new(3)));

        reference.set(widget(9, "nine"));
        assert_eq!(reference.target_id(), Some(EntityId::new(9)));
    }

    #[test]
    fn test_reference_to_unsaved_entity_has_no_id() {
        let reference = Reference::to(widget(0, "new"));
        assert!(reference.is_loaded());
        assert_eq!(reference.target_id(), None);
    }

    #[test]
    fn test_detach_preserves_id() {
        let mut reference = Reference::to(widget(9, "nine"));
        reference.detach();
        assert!(!reference.is_loaded());
        assert_eq!(reference.target_id(), Some(EntityId::new(9)));
    }

    #[test]
    fn test_reference_serializes_as_fk_scalar() {
        let reference = Reference::to(widget(5, "five"));
        assert_eq!(serde_json::to_value(&reference).unwrap(), serde_json::json!(5));

        let empty: Reference<Widget> = Reference::none();
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::Value::Null
        );

        let back: Reference<Widget> = serde_json::from_value(serde_json::json!(5)).unwrap();
        assert_eq!(back.target_id(), Some(EntityId::new(5)));
        assert!(!back.is_loaded());
    }

    #[test]
    fn test_children_strip_and_reattach() {
        let mut children = Children::from_vec(vec![widget(1, "a"), widget(2, "b")]);
        assert!(children.is_loaded());
        assert_eq!(children.len(), 2);

        let taken = children.take_all().unwrap();
        assert_eq!(taken.len(), 2);
        assert!(!children.is_loaded());
        assert!(children.take_all().is_none());

        children.set_all(taken);
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_children_serialize_as_null() {
        let children = Children::from_vec(vec![widget(1, "a")]);
        assert_eq!(
            serde_json::to_value(&children).unwrap(),
            serde_json::Value::Null
        );

        let back: Children<Widget> = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert!(!back.is_loaded());
    }
}
