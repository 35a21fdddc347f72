//! Collection binder - provision tagged entities, render the tag's archetype.
//!
//! On mount `initial` fresh entities are created and tagged. The tag's
//! archetype is then subscribed, and its live membership is rendered through
//! an entity list. On unmount, or when `tag` or `initial` changes, every
//! current member is destroyed, including entities tagged by someone else
//! after mount: the collection owns its members, not only what it created.
//! A new `tag` moves the subscription to the new tag's archetype.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::entities::{unmount_items, EntityList, ItemChildren};
use super::Ecs;
use crate::error::Result;
use crate::runtime::{Cleanup, KeyedEffect, Node, PropValue, Rerender};
use crate::store::{Archetype, ComponentValue, Entity, Query, Store};

/// Props for [`Ecs::collection`].
#[derive(Default)]
pub struct CollectionProps {
    /// Marker component carried by every member.
    pub tag: PropValue<String>,
    /// Number of entities created on mount.
    pub initial: PropValue<usize>,
    /// Re-render a member's subtree only when its entity reference changes.
    pub memoize: bool,
    /// Subtree for each member.
    pub children: Option<ItemChildren>,
}

impl CollectionProps {
    /// Collection of `initial` entities tagged `tag`, rendering nothing per member.
    pub fn new(tag: impl Into<PropValue<String>>, initial: impl Into<PropValue<usize>>) -> Self {
        Self {
            tag: tag.into(),
            initial: initial.into(),
            ..Self::default()
        }
    }

    /// Skip re-rendering members whose entity is unchanged.
    pub fn memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Set the per-member subtree.
    pub fn children(mut self, children: impl Fn(&Entity) -> Result<Node> + 'static) -> Self {
        self.children = Some(Rc::new(children));
        self
    }
}

// =============================================================================
// Provisioning
// =============================================================================

type Provision = KeyedEffect<(String, usize)>;

/// Create `count` entities tagged `tag`, unless `(tag, count)` is unchanged.
///
/// The teardown purges `archetype`, the view of the tag it was set up for.
fn provision(
    store: &Rc<dyn Store>,
    archetype: &Rc<Archetype>,
    effect: &mut Provision,
    tag: &str,
    count: usize,
) -> Result<bool> {
    effect.run((tag.to_string(), count), |(tag, count)| {
        let mut created: Vec<Entity> = Vec::with_capacity(*count);
        for _ in 0..*count {
            let entity = store.create_entity();
            created.push(entity.clone());
            if let Err(err) = store.add_component(&entity, tag, ComponentValue::tag()) {
                for entity in &created {
                    if store.contains(entity) {
                        store.destroy_entity(entity);
                    }
                }
                return Err(err.into());
            }
        }
        debug!(tag = %tag, count = *count, "collection provisioned");

        let store = store.clone();
        let archetype = archetype.clone();
        Ok(Some(Box::new(move || purge(&store, &archetype)) as Cleanup))
    })
}

/// Destroy every current member of `archetype`.
fn purge(store: &Rc<dyn Store>, archetype: &Archetype) {
    let members = archetype.entities();
    let mut destroyed = 0;
    for entity in &members {
        if store.contains(entity) && store.destroy_entity(entity) {
            destroyed += 1;
        }
    }
    debug!(query = %archetype.query(), destroyed, "collection purged");
}

// =============================================================================
// Binder
// =============================================================================

impl Ecs {
    /// Mount a collection binder.
    pub fn collection(&self, props: CollectionProps) -> Result<Node> {
        let CollectionProps {
            tag,
            initial,
            memoize,
            children,
        } = props;

        let mut current_tag = tag.get();
        let archetype = self.store.archetype(&Query::from(current_tag.as_str()));

        let mut effect = Provision::new();
        provision(&self.store, &archetype, &mut effect, &current_tag, initial.get())?;
        let effect = Rc::new(RefCell::new(effect));

        // Archetype currently rendered. Replaced when the tag changes.
        let current = Rc::new(RefCell::new(archetype.clone()));
        let list = Rc::new(RefCell::new(EntityList::new(self.clone(), memoize, children)));
        let rerender = {
            let list = list.clone();
            let current = current.clone();
            Rerender::with_render(move || {
                let members = current.borrow().entities();
                list.borrow_mut().sync(&members)
            })
        };

        // The forced render mounts the initial members.
        let subscription = self.subscribe_archetype(archetype, &rerender)?;
        let subscription = Rc::new(RefCell::new(Some(subscription)));

        let ecs = self.clone();
        let effect_render = effect.clone();
        let subscription_render = subscription.clone();
        let rerender_render = rerender.clone();
        Ok(Node::new(
            move || {
                let next_tag = tag.get();
                let count = initial.get();

                if next_tag == current_tag {
                    let archetype = current.borrow().clone();
                    provision(
                        &ecs.store,
                        &archetype,
                        &mut effect_render.borrow_mut(),
                        &next_tag,
                        count,
                    )?;
                    return rerender_render.trigger();
                }

                // Detach from the old archetype before its members are purged.
                let previous = subscription_render.borrow_mut().take();
                drop(previous);

                let archetype = ecs.store.archetype(&Query::from(next_tag.as_str()));
                *current.borrow_mut() = archetype.clone();
                provision(
                    &ecs.store,
                    &archetype,
                    &mut effect_render.borrow_mut(),
                    &next_tag,
                    count,
                )?;

                let next = ecs.subscribe_archetype(archetype, &rerender_render)?;
                *subscription_render.borrow_mut() = Some(next);
                debug!(from = %current_tag, to = %next_tag, "collection retargeted");
                current_tag = next_tag;
                Ok(())
            },
            move || {
                let previous = subscription.borrow_mut().take();
                drop(previous);
                rerender.dispose();
                let items = list.borrow_mut().take_items();
                unmount_items(items);
                effect.borrow_mut().dispose();
            },
        ))
    }
}
