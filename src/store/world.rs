//! World - in-memory [`Store`] implementation.
//!
//! Manages the lifecycle of entities:
//! - Monotonic id allocation (ids are never reused)
//! - Id → handle map of live entities
//! - Archetype views memoized by query signature and kept in sync on every
//!   create / destroy / add / remove
//!
//! Notifications are emitted only after internal borrows are released, so
//! listeners are free to call back into the world.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::archetype::{Archetype, Query};
use super::entity::{ComponentValue, Entity, EntityId};
use super::Store;
use crate::error::StoreError;

/// In-memory entity-component world.
#[derive(Default)]
pub struct World {
    /// Next id to hand out.
    next_id: Cell<u64>,

    /// Live entities by id.
    entities: RefCell<HashMap<EntityId, Entity>>,

    /// Archetype views by query signature.
    archetypes: RefCell<HashMap<Query, Rc<Archetype>>>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live entity by id.
    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.entities.borrow().get(&id).cloned()
    }

    /// Number of archetype views created so far.
    pub fn archetype_count(&self) -> usize {
        self.archetypes.borrow().len()
    }

    /// Snapshot of every view. Taken before notifying so listeners can
    /// request new archetypes while we iterate.
    fn archetype_snapshot(&self) -> Vec<Rc<Archetype>> {
        self.archetypes.borrow().values().cloned().collect()
    }

    /// Bring every view in line with `entity`'s current components.
    fn reindex(&self, entity: &Entity) {
        for archetype in self.archetype_snapshot() {
            if archetype.query().matches(entity) {
                archetype.insert(entity);
            } else {
                archetype.remove(entity);
            }
        }
    }

    fn check_alive(&self, entity: &Entity) -> Result<(), StoreError> {
        if self.contains(entity) {
            Ok(())
        } else {
            Err(StoreError::EntityNotFound(entity.id()))
        }
    }
}

impl Store for World {
    fn create_entity(&self) -> Entity {
        let id = EntityId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let entity = Entity::new(id);
        self.entities.borrow_mut().insert(id, entity.clone());
        debug!(entity = %id, "entity created");

        // Only the empty query can match a component-less entity.
        self.reindex(&entity);
        entity
    }

    fn destroy_entity(&self, entity: &Entity) -> bool {
        let removed = self.entities.borrow_mut().remove(&entity.id());
        let Some(removed) = removed else {
            return false;
        };
        if !removed.ptr_eq(entity) {
            // Same id, foreign handle: put it back untouched.
            self.entities.borrow_mut().insert(removed.id(), removed);
            return false;
        }

        entity.mark_destroyed();
        debug!(entity = %entity.id(), "entity destroyed");

        for archetype in self.archetype_snapshot() {
            archetype.remove(entity);
        }
        true
    }

    fn contains(&self, entity: &Entity) -> bool {
        self.entities
            .borrow()
            .get(&entity.id())
            .is_some_and(|live| live.ptr_eq(entity))
    }

    fn add_component(
        &self,
        entity: &Entity,
        name: &str,
        value: ComponentValue,
    ) -> Result<(), StoreError> {
        self.check_alive(entity)?;
        if !entity.insert_component(name, value) {
            return Err(StoreError::DuplicateComponent {
                entity: entity.id(),
                name: name.to_string(),
            });
        }
        debug!(entity = %entity.id(), component = name, "component added");

        self.reindex(entity);
        Ok(())
    }

    fn remove_component(&self, entity: &Entity, name: &str) -> Result<(), StoreError> {
        self.check_alive(entity)?;
        if entity.remove_component(name).is_none() {
            return Err(StoreError::MissingComponent {
                entity: entity.id(),
                name: name.to_string(),
            });
        }
        debug!(entity = %entity.id(), component = name, "component removed");

        self.reindex(entity);
        Ok(())
    }

    fn archetype(&self, query: &Query) -> Rc<Archetype> {
        if let Some(existing) = self.archetypes.borrow().get(query) {
            return existing.clone();
        }

        let archetype = Rc::new(Archetype::new(query.clone()));
        for entity in self.entities() {
            if query.matches(&entity) {
                archetype.seed(&entity);
            }
        }
        self.archetypes
            .borrow_mut()
            .insert(query.clone(), archetype.clone());
        archetype
    }

    fn entities(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.entities.borrow().values().cloned().collect();
        entities.sort_by_key(Entity::id);
        entities
    }

    fn len(&self) -> usize {
        self.entities.borrow().len()
    }
}
