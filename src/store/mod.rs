//! Store - the entity-component world the binders mutate.
//!
//! The [`Store`] trait is the whole contract the binding layer relies on:
//! create/destroy entities, add/remove components, an existence check for
//! teardown guards, and memoized [`Archetype`] views with `added`/`removed`
//! channels.
//!
//! [`World`] is the in-memory implementation. Stores are constructed and
//! passed explicitly (no hidden global), so every test can build its own.
//!
//! # Architecture
//!
//! ```text
//! World ──owns──▶ Entity handles (id + component map)
//!   │
//!   └──memoizes──▶ Archetype per Query ──▶ members + added/removed listeners
//! ```

mod archetype;
mod entity;
mod world;

pub use archetype::{Archetype, ArchetypeEvents, Listener, Query};
pub use entity::{ComponentValue, Entity, EntityId, Tag};
pub use world::World;

use std::rc::Rc;

use crate::error::StoreError;

/// The entity-component store contract.
///
/// All methods take `&self`: stores are shared through `Rc` and rely on the
/// single-threaded execution model instead of locking.
pub trait Store {
    /// Create a new, component-less entity.
    fn create_entity(&self) -> Entity;

    /// Destroy `entity`. Returns false (and does nothing) if it is already gone.
    fn destroy_entity(&self, entity: &Entity) -> bool;

    /// Whether `entity` still exists in this store.
    fn contains(&self, entity: &Entity) -> bool;

    /// Attach component `name` to `entity`.
    fn add_component(
        &self,
        entity: &Entity,
        name: &str,
        value: ComponentValue,
    ) -> Result<(), StoreError>;

    /// Detach component `name` from `entity`.
    fn remove_component(&self, entity: &Entity, name: &str) -> Result<(), StoreError>;

    /// Obtain the live view for `query`. Repeated calls with the same
    /// signature return the same `Rc`.
    fn archetype(&self, query: &Query) -> Rc<Archetype>;

    /// All live entities, ordered by id.
    fn entities(&self) -> Vec<Entity>;

    /// Number of live entities.
    fn len(&self) -> usize {
        self.entities().len()
    }

    /// True when the store holds no entity.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
