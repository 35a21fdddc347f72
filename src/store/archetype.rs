//! Archetypes - live, indexed views over a store's entities.
//!
//! An [`Archetype`] holds every entity carrying all the component names of
//! its [`Query`], in insertion order, plus two listener registries that fire
//! when an entity enters or leaves the view.
//!
//! Listener registration is idempotent per listener identity: subscribing the
//! same `Rc` twice keeps one registration, unsubscribing removes it.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::entity::Entity;

// =============================================================================
// Query
// =============================================================================

/// Query signature: the set of component names an entity must carry.
///
/// Names are deduplicated and ordered, so `["a", "b"]` and `["b", "a", "a"]`
/// are the same signature. The empty query matches every entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Query(BTreeSet<String>);

impl Query {
    /// Build a query from component names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Required component names, ordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether `name` is part of the signature.
    pub fn requires(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Whether `entity` currently matches.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.0.iter().all(|name| entity.has(name))
    }
}

impl From<&str> for Query {
    fn from(name: &str) -> Self {
        Query::new([name])
    }
}

impl From<String> for Query {
    fn from(name: String) -> Self {
        Query::new([name])
    }
}

impl<const N: usize> From<[&str; N]> for Query {
    fn from(names: [&str; N]) -> Self {
        Query::new(names)
    }
}

impl From<&[&str]> for Query {
    fn from(names: &[&str]) -> Self {
        Query::new(names.iter().copied())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", name)?;
        }
        write!(f, "]")
    }
}

// =============================================================================
// Events & Listeners
// =============================================================================

bitflags::bitflags! {
    /// Archetype notification channels.
    ///
    /// Combine with bitwise OR: `ArchetypeEvents::ADDED | ArchetypeEvents::REMOVED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArchetypeEvents: u8 {
        const ADDED = 1 << 0;
        const REMOVED = 1 << 1;
        const ALL = Self::ADDED.bits() | Self::REMOVED.bits();
    }
}

/// Callback invoked with the entity that entered or left an archetype.
pub type Listener = Rc<dyn Fn(&Entity)>;

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// One notification channel.
#[derive(Default)]
struct ListenerRegistry {
    listeners: RefCell<Vec<Listener>>,
}

impl ListenerRegistry {
    fn on(&self, listener: &Listener) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|l| same_listener(l, listener)) {
            listeners.push(listener.clone());
        }
    }

    fn off(&self, listener: &Listener) {
        self.listeners
            .borrow_mut()
            .retain(|l| !same_listener(l, listener));
    }

    fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn emit(&self, entity: &Entity) {
        // Snapshot first: listeners may subscribe, unsubscribe or mutate the store.
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(entity);
        }
    }
}

// =============================================================================
// Archetype
// =============================================================================

/// Live view of the entities matching a [`Query`].
pub struct Archetype {
    query: Query,
    members: RefCell<Vec<Entity>>,
    on_added: ListenerRegistry,
    on_removed: ListenerRegistry,
}

impl Archetype {
    /// Create an empty view. Stores index it; binders never build one directly.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            members: RefCell::new(Vec::new()),
            on_added: ListenerRegistry::default(),
            on_removed: ListenerRegistry::default(),
        }
    }

    /// The query this view answers.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Current members in insertion order.
    pub fn entities(&self) -> Vec<Entity> {
        self.members.borrow().clone()
    }

    /// Number of current members.
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    /// True when no entity matches.
    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    /// Whether `entity` is a current member.
    pub fn contains(&self, entity: &Entity) -> bool {
        self.members.borrow().iter().any(|e| e.ptr_eq(entity))
    }

    /// Register `listener` on the channels in `events`.
    pub fn subscribe(&self, events: ArchetypeEvents, listener: &Listener) {
        if events.contains(ArchetypeEvents::ADDED) {
            self.on_added.on(listener);
        }
        if events.contains(ArchetypeEvents::REMOVED) {
            self.on_removed.on(listener);
        }
    }

    /// Remove `listener` from the channels in `events`.
    pub fn unsubscribe(&self, events: ArchetypeEvents, listener: &Listener) {
        if events.contains(ArchetypeEvents::ADDED) {
            self.on_added.off(listener);
        }
        if events.contains(ArchetypeEvents::REMOVED) {
            self.on_removed.off(listener);
        }
    }

    /// Number of listeners on one channel.
    pub fn listener_count(&self, event: ArchetypeEvents) -> usize {
        let mut count = 0;
        if event.contains(ArchetypeEvents::ADDED) {
            count += self.on_added.len();
        }
        if event.contains(ArchetypeEvents::REMOVED) {
            count += self.on_removed.len();
        }
        count
    }

    /// Add `entity` silently. Used when indexing a freshly created view.
    pub(crate) fn seed(&self, entity: &Entity) {
        self.members.borrow_mut().push(entity.clone());
    }

    /// Add `entity` and notify the `added` channel. No-op if already a member.
    pub(crate) fn insert(&self, entity: &Entity) -> bool {
        {
            let mut members = self.members.borrow_mut();
            if members.iter().any(|e| e.ptr_eq(entity)) {
                return false;
            }
            members.push(entity.clone());
        }
        trace!(archetype = %self.query, entity = %entity.id(), "entity added");
        self.on_added.emit(entity);
        true
    }

    /// Remove `entity` and notify the `removed` channel. No-op if not a member.
    pub(crate) fn remove(&self, entity: &Entity) -> bool {
        {
            let mut members = self.members.borrow_mut();
            let Some(position) = members.iter().position(|e| e.ptr_eq(entity)) else {
                return false;
            };
            members.remove(position);
        }
        trace!(archetype = %self.query, entity = %entity.id(), "entity removed");
        self.on_removed.emit(entity);
        true
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("query", &self.query)
            .field("len", &self.len())
            .finish()
    }
}
