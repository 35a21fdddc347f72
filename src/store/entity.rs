//! Entity handles and component values.
//!
//! An [`Entity`] is a cheap, reference-counted handle. Its identity (the
//! [`EntityId`] and the handle's allocation) is stable for the entity's whole
//! lifetime, which makes it the natural list and memoization key.
//!
//! Components are stored on the handle itself as type-erased
//! [`ComponentValue`]s keyed by name. Only the store mutates them; everyone
//! else reads.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

// =============================================================================
// Entity Id
// =============================================================================

/// Unique entity identity. Ids are never reused by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// =============================================================================
// Component Value
// =============================================================================

/// Marker payload used for tag components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tag;

/// A type-erased component value.
///
/// Equality is identity: two values are equal only when they share the same
/// allocation. Binders re-apply a component when its value identity changes,
/// never on structural comparison.
#[derive(Clone)]
pub struct ComponentValue(Rc<dyn Any>);

impl ComponentValue {
    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Wrap an already shared value, keeping its identity.
    pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
        Self(value)
    }

    /// A fresh tag marker.
    pub fn tag() -> Self {
        Self::new(Tag)
    }

    /// Whether this value is a tag marker.
    pub fn is_tag(&self) -> bool {
        self.0.is::<Tag>()
    }

    /// Typed view of the payload.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        self.0.clone().downcast::<T>().ok()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for ComponentValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tag() {
            f.write_str("ComponentValue(Tag)")
        } else {
            write!(f, "ComponentValue({:p})", Rc::as_ptr(&self.0))
        }
    }
}

// =============================================================================
// Entity
// =============================================================================

struct EntityData {
    id: EntityId,
    alive: Cell<bool>,
    components: RefCell<HashMap<String, ComponentValue>>,
}

/// Handle to an entity owned by a store.
///
/// Cloning the handle does not clone the entity. Equality compares handle
/// identity, hashing uses the id.
#[derive(Clone)]
pub struct Entity(Rc<EntityData>);

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self(Rc::new(EntityData {
            id,
            alive: Cell::new(true),
            components: RefCell::new(HashMap::new()),
        }))
    }

    /// The entity's id.
    pub fn id(&self) -> EntityId {
        self.0.id
    }

    /// False once the owning store destroyed the entity.
    pub fn is_alive(&self) -> bool {
        self.0.alive.get()
    }

    /// Whether the entity carries component `name`.
    pub fn has(&self, name: &str) -> bool {
        self.0.components.borrow().contains_key(name)
    }

    /// Current value of component `name`.
    pub fn get(&self, name: &str) -> Option<ComponentValue> {
        self.0.components.borrow().get(name).cloned()
    }

    /// Current value of component `name`, downcast to `T`.
    pub fn get_as<T: Any>(&self, name: &str) -> Option<Rc<T>> {
        self.get(name).and_then(|value| value.downcast::<T>())
    }

    /// Names of all attached components, sorted.
    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.components.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Handle identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn insert_component(&self, name: &str, value: ComponentValue) -> bool {
        let mut components = self.0.components.borrow_mut();
        if components.contains_key(name) {
            return false;
        }
        components.insert(name.to_string(), value);
        true
    }

    pub(crate) fn remove_component(&self, name: &str) -> Option<ComponentValue> {
        self.0.components.borrow_mut().remove(name)
    }

    pub(crate) fn mark_destroyed(&self) {
        self.0.alive.set(false);
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.0.id)
            .field("alive", &self.is_alive())
            .field("components", &self.component_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    #[test]
    fn test_value_identity() {
        let a = ComponentValue::new(Health(10));
        let b = ComponentValue::new(Health(10));

        assert_eq!(a, a.clone());
        assert_ne!(a, b, "equal payloads in different allocations are different values");
    }

    #[test]
    fn test_downcast() {
        let value = ComponentValue::new(Health(3));
        assert_eq!(value.downcast::<Health>().as_deref(), Some(&Health(3)));
        assert!(value.downcast::<String>().is_none());
        assert!(!value.is_tag());
        assert!(ComponentValue::tag().is_tag());
    }

    #[test]
    fn test_entity_components() {
        let entity = Entity::new(EntityId(1));
        assert!(entity.insert_component("health", ComponentValue::new(Health(5))));
        assert!(!entity.insert_component("health", ComponentValue::new(Health(6))));

        assert!(entity.has("health"));
        assert_eq!(entity.get_as::<Health>("health").as_deref(), Some(&Health(5)));
        assert_eq!(entity.component_names(), vec!["health".to_string()]);

        assert!(entity.remove_component("health").is_some());
        assert!(!entity.has("health"));
    }

    #[test]
    fn test_entity_equality_is_handle_identity() {
        let a = Entity::new(EntityId(1));
        let same = a.clone();
        let other = Entity::new(EntityId(1));

        assert_eq!(a, same);
        assert_ne!(a, other);
    }
}
