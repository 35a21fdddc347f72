//! Archetype subscription - re-render a subscriber when a query's membership changes.
//!
//! The archetype handle is requested from the store once per subscription
//! and kept for its whole life, so subscribe and unsubscribe always target
//! the same notification source. Both the `added` and `removed` channels
//! trigger the subscriber's [`Rerender`].
//!
//! Right after subscribing, the subscriber is rendered once unconditionally:
//! entities may have entered the archetype between the handle being obtained
//! and the listeners being attached (sibling setup code runs first), and the
//! forced render re-reads current membership instead of relying on events.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{error, trace};

use super::Ecs;
use crate::error::Result;
use crate::runtime::Rerender;
use crate::store::{Archetype, ArchetypeEvents, Entity, Listener, Query};

/// Live subscription of a [`Rerender`] trigger to an archetype.
///
/// Dropping the subscription unsubscribes.
pub struct ArchetypeSubscription {
    archetype: Rc<Archetype>,
    listener: Listener,
    active: Cell<bool>,
}

impl ArchetypeSubscription {
    /// The memoized archetype handle.
    pub fn archetype(&self) -> &Rc<Archetype> {
        &self.archetype
    }

    /// Current members, in the store's insertion order.
    pub fn entities(&self) -> Vec<Entity> {
        self.archetype.entities()
    }

    /// Number of current members.
    pub fn len(&self) -> usize {
        self.archetype.len()
    }

    /// True when the archetype has no member.
    pub fn is_empty(&self) -> bool {
        self.archetype.is_empty()
    }

    /// Whether the listeners are still attached.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Detach from both channels. Idempotent.
    pub fn unsubscribe(&self) {
        if self.active.replace(false) {
            self.archetype
                .unsubscribe(ArchetypeEvents::ALL, &self.listener);
        }
    }
}

impl Drop for ArchetypeSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for ArchetypeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchetypeSubscription")
            .field("query", self.archetype.query())
            .field("active", &self.is_active())
            .finish()
    }
}

impl Ecs {
    /// Subscribe `rerender` to the archetype for `query`.
    ///
    /// Triggers `rerender` once before returning; its error, if any, is
    /// returned and the subscription is dropped.
    pub fn use_archetype(
        &self,
        query: impl Into<Query>,
        rerender: &Rerender,
    ) -> Result<ArchetypeSubscription> {
        let archetype = self.store.archetype(&query.into());
        self.subscribe_archetype(archetype, rerender)
    }

    /// Subscribe `rerender` to an archetype handle obtained earlier.
    pub(crate) fn subscribe_archetype(
        &self,
        archetype: Rc<Archetype>,
        rerender: &Rerender,
    ) -> Result<ArchetypeSubscription> {
        let trigger = rerender.clone();
        let listener: Listener = Rc::new(move |entity: &Entity| {
            trace!(entity = %entity.id(), "archetype changed, re-rendering");
            if let Err(err) = trigger.trigger() {
                error!(%err, "re-render after archetype change failed");
            }
        });
        archetype.subscribe(ArchetypeEvents::ALL, &listener);

        let subscription = ArchetypeSubscription {
            archetype,
            listener,
            active: Cell::new(true),
        };

        rerender.trigger()?;
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::reset_entity_context;
    use crate::store::{ComponentValue, Store, World};

    fn setup() -> (Rc<World>, Ecs) {
        reset_entity_context();
        let world = Rc::new(World::new());
        (world.clone(), Ecs::new(world))
    }

    #[test]
    fn test_forced_render_on_subscribe() {
        let (_world, ecs) = setup();
        let rerender = Rerender::new();

        let _subscription = ecs.use_archetype("enemy", &rerender).unwrap();
        assert_eq!(rerender.version(), 1);
    }

    #[test]
    fn test_notified_on_add_and_remove() {
        let (world, ecs) = setup();
        let rerender = Rerender::new();
        let subscription = ecs.use_archetype("enemy", &rerender).unwrap();

        let entity = world.create_entity();
        world
            .add_component(&entity, "enemy", ComponentValue::tag())
            .unwrap();
        assert_eq!(rerender.version(), 2);
        assert_eq!(subscription.entities(), vec![entity.clone()]);

        world.destroy_entity(&entity);
        assert_eq!(rerender.version(), 3);
        assert!(subscription.is_empty());
    }

    #[test]
    fn test_sees_entities_added_before_subscribing() {
        let (world, ecs) = setup();
        let entity = world.create_entity();
        world
            .add_component(&entity, "enemy", ComponentValue::tag())
            .unwrap();

        let seen = Rc::new(Cell::new(0));
        let seen_clone = seen.clone();
        let archetype = world.archetype(&Query::from("enemy"));
        let rerender = Rerender::with_render(move || {
            seen_clone.set(archetype.len());
            Ok(())
        });

        let _subscription = ecs.use_archetype("enemy", &rerender).unwrap();
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_siblings_share_archetype() {
        let (_world, ecs) = setup();
        let a = ecs.use_archetype(["enemy", "alive"], &Rerender::new()).unwrap();
        let b = ecs.use_archetype(["alive", "enemy"], &Rerender::new()).unwrap();

        assert!(Rc::ptr_eq(a.archetype(), b.archetype()));
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (world, ecs) = setup();
        let rerender = Rerender::new();
        let subscription = ecs.use_archetype("enemy", &rerender).unwrap();
        assert_eq!(
            subscription.archetype().listener_count(ArchetypeEvents::ALL),
            2
        );

        drop(subscription);

        let entity = world.create_entity();
        world
            .add_component(&entity, "enemy", ComponentValue::tag())
            .unwrap();
        assert_eq!(rerender.version(), 1);
        assert_eq!(
            world
                .archetype(&Query::from("enemy"))
                .listener_count(ArchetypeEvents::ALL),
            0
        );
    }

    #[test]
    fn test_irrelevant_changes_do_not_notify() {
        let (world, ecs) = setup();
        let rerender = Rerender::new();
        let _subscription = ecs.use_archetype("enemy", &rerender).unwrap();

        let entity = world.create_entity();
        world
            .add_component(&entity, "friend", ComponentValue::tag())
            .unwrap();
        assert_eq!(rerender.version(), 1);
    }
}
