//! Shared fixtures: a store wrapper that records every mutation.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use spark_ecs::{Archetype, ComponentValue, Ecs, Entity, Query, Store, StoreError, World};

/// One store mutation, as seen by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(u64),
    Destroy(u64),
    Add(u64, String),
    Remove(u64, String),
}

/// [`World`] wrapper logging every mutation that reaches the store.
#[derive(Default)]
pub struct RecordingStore {
    world: World,
    log: RefCell<Vec<Mutation>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.log.borrow().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<Mutation> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    fn record(&self, mutation: Mutation) {
        self.log.borrow_mut().push(mutation);
    }
}

impl Store for RecordingStore {
    fn create_entity(&self) -> Entity {
        let entity = self.world.create_entity();
        self.record(Mutation::Create(entity.id().0));
        entity
    }

    fn destroy_entity(&self, entity: &Entity) -> bool {
        self.record(Mutation::Destroy(entity.id().0));
        self.world.destroy_entity(entity)
    }

    fn contains(&self, entity: &Entity) -> bool {
        self.world.contains(entity)
    }

    fn add_component(
        &self,
        entity: &Entity,
        name: &str,
        value: ComponentValue,
    ) -> Result<(), StoreError> {
        self.record(Mutation::Add(entity.id().0, name.to_string()));
        self.world.add_component(entity, name, value)
    }

    fn remove_component(&self, entity: &Entity, name: &str) -> Result<(), StoreError> {
        self.record(Mutation::Remove(entity.id().0, name.to_string()));
        self.world.remove_component(entity, name)
    }

    fn archetype(&self, query: &Query) -> Rc<Archetype> {
        self.world.archetype(query)
    }

    fn entities(&self) -> Vec<Entity> {
        self.world.entities()
    }
}

/// Fresh recording store, bound.
pub fn recording() -> (Rc<RecordingStore>, Ecs) {
    spark_ecs::reset_entity_context();
    let store = Rc::new(RecordingStore::new());
    (store.clone(), Ecs::new(store))
}

/// Fresh in-memory world, bound.
pub fn world() -> (Rc<World>, Ecs) {
    spark_ecs::reset_entity_context();
    let world = Rc::new(World::new());
    (world.clone(), Ecs::new(world))
}

/// Create an entity carrying `tag`, outside of any binder.
pub fn spawn_tagged(store: &dyn Store, tag: &str) -> Entity {
    let entity = store.create_entity();
    store
        .add_component(&entity, tag, ComponentValue::tag())
        .expect("fresh entity has no components");
    entity
}
