//! Bindings - tree lifecycle mapped onto store mutations.
//!
//! This module provides the binders:
//! - [`Ecs::entity`] - bind a node to an entity (created and owned, or supplied)
//! - [`Ecs::component`] - attach a named component to the ambient entity
//! - [`Ecs::collection`] - provision tagged entities and render their archetype
//! - [`Ecs::use_archetype`] - subscribe a re-render trigger to a query
//! - [`Ecs::entities`] - render one subtree per entity, keyed by identity
//!
//! # Component Lifecycle
//!
//! ## entity()
//! - Mount: reuse the supplied entity or create one, then mount children with
//!   the entity as ambient context
//! - Re-render: the bound entity never changes; children re-render
//! - Unmount: children unmount, then a created entity is destroyed (a
//!   supplied one never is)
//!
//! ## component()
//! - The entity is the ambient one at mount and never changes
//! - Attach when name or value identity changes (remove first)
//! - Unmount: remove, unless the entity is already gone
//!
//! ## collection()
//! - Mount: create `initial` tagged entities, subscribe to the tag archetype
//! - Unmount: destroy every current member, not only the provisioned ones
//!
//! # Example
//!
//! ```ignore
//! let ecs = Ecs::new(Rc::new(World::new()));
//!
//! let node = ecs.entity(EntityProps::with_children({
//!     let ecs = ecs.clone();
//!     move |_entity| ecs.component(ComponentProps::data("health", value(100u32)))
//! }))?;
//!
//! node.unmount(); // entity destroyed
//! ```

mod archetype;
mod collection;
mod component;
mod entities;
mod entity;

pub use archetype::ArchetypeSubscription;
pub use collection::CollectionProps;
pub use component::{ComponentProps, ComponentRef, ComponentSource, RefChild};
pub use entities::{EntitiesProps, ItemChildren};
pub use entity::{Children, EntityProps};

use std::fmt;
use std::rc::Rc;

use crate::runtime::current_entity;
use crate::store::{Entity, Store, World};

/// A store bundled with every binder.
///
/// Cheap to clone: clones share the store.
#[derive(Clone)]
pub struct Ecs {
    store: Rc<dyn Store>,
}

impl Ecs {
    /// Bind to `store`.
    pub fn new<S: Store + 'static>(store: Rc<S>) -> Self {
        Self { store }
    }

    /// Bind to an existing shared store.
    pub fn from_store(store: Rc<dyn Store>) -> Self {
        Self { store }
    }

    /// The bound store.
    pub fn store(&self) -> &Rc<dyn Store> {
        &self.store
    }

    /// The ambient entity, if called under an entity binder.
    pub fn use_entity() -> Option<Entity> {
        current_entity()
    }
}

impl Default for Ecs {
    fn default() -> Self {
        Self::new(Rc::new(World::new()))
    }
}

impl fmt::Debug for Ecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecs")
            .field("entities", &self.store.len())
            .finish()
    }
}
