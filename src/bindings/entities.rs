//! Entity list renderer - one subtree per entity, keyed by identity.
//!
//! Items are matched across renders by [`EntityId`]. New entities mount a
//! subtree (under an entity binder, so the item is the ambient entity),
//! vanished entities unmount theirs, and surviving entities either re-render
//! (default) or are left alone (memoized). Output order is the order of the
//! input list.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use super::{Ecs, EntityProps};
use crate::error::Result;
use crate::runtime::{Node, PropValue};
use crate::store::{Entity, EntityId};

/// Per-entity subtree factory.
pub type ItemChildren = Rc<dyn Fn(&Entity) -> Result<Node>>;

/// Props for [`Ecs::entities`].
#[derive(Default)]
pub struct EntitiesProps {
    /// Entities to render, re-read on every render.
    pub entities: PropValue<Vec<Entity>>,
    /// Re-render an item only when its entity reference changes.
    pub memoize: bool,
    /// Subtree for each entity. `None` renders nothing per item.
    pub children: Option<ItemChildren>,
}

impl EntitiesProps {
    /// Render `children` for each entity of `entities`.
    pub fn new(
        entities: impl Into<PropValue<Vec<Entity>>>,
        children: impl Fn(&Entity) -> Result<Node> + 'static,
    ) -> Self {
        Self {
            entities: entities.into(),
            memoize: false,
            children: Some(Rc::new(children)),
        }
    }

    /// Skip re-rendering items whose entity is unchanged.
    pub fn memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }
}

pub(crate) struct ListItem {
    entity: Entity,
    node: Node,
}

/// Keyed list of mounted item subtrees.
pub(crate) struct EntityList {
    ecs: Ecs,
    memoize: bool,
    children: Option<ItemChildren>,
    items: Vec<ListItem>,
}

impl EntityList {
    pub(crate) fn new(ecs: Ecs, memoize: bool, children: Option<ItemChildren>) -> Self {
        Self {
            ecs,
            memoize,
            children,
            items: Vec::new(),
        }
    }

    /// Entities currently mounted, in render order.
    #[cfg(test)]
    pub(crate) fn entities(&self) -> Vec<Entity> {
        self.items.iter().map(|item| item.entity.clone()).collect()
    }

    /// Reconcile mounted items with `entities`.
    ///
    /// On error, items not yet reconciled stay mounted so a later sync can
    /// settle them.
    pub(crate) fn sync(&mut self, entities: &[Entity]) -> Result<()> {
        let mut previous: HashMap<EntityId, ListItem> = self
            .items
            .drain(..)
            .map(|item| (item.entity.id(), item))
            .collect();
        let mut next = Vec::with_capacity(entities.len());
        let mut seen = HashSet::with_capacity(entities.len());
        let mut result = Ok(());

        for entity in entities {
            if !seen.insert(entity.id()) {
                warn!(entity = %entity.id(), "duplicate entity in list, skipped");
                continue;
            }

            let reused = match previous.remove(&entity.id()) {
                Some(item) if item.entity.ptr_eq(entity) => Some(item),
                // Same id, different reference: remount.
                Some(stale) => {
                    drop(stale);
                    None
                }
                None => None,
            };

            let step = match reused {
                Some(mut item) => {
                    let rendered = if self.memoize {
                        Ok(())
                    } else {
                        item.node.rerender()
                    };
                    next.push(item);
                    rendered
                }
                None => self.mount(entity).map(|item| next.push(item)),
            };

            if let Err(err) = step {
                result = Err(err);
                break;
            }
        }

        if result.is_err() {
            next.extend(previous.into_values());
        } else {
            trace!(
                mounted = next.len(),
                removed = previous.len(),
                "entity list synced"
            );
            drop(previous);
        }
        self.items = next;
        result
    }

    fn mount(&self, entity: &Entity) -> Result<ListItem> {
        let mut props = EntityProps::existing(entity.clone());
        if let Some(children) = &self.children {
            let children = children.clone();
            props = props.children(move |entity| children(entity));
        }

        let node = if self.memoize {
            self.ecs.memoized_entity(props)?
        } else {
            self.ecs.entity(props)?
        };
        Ok(ListItem {
            entity: entity.clone(),
            node,
        })
    }

    /// Detach every item without unmounting it.
    pub(crate) fn take_items(&mut self) -> Vec<ListItem> {
        std::mem::take(&mut self.items)
    }
}

/// Unmount detached items, last first.
pub(crate) fn unmount_items(mut items: Vec<ListItem>) {
    while let Some(item) = items.pop() {
        item.node.unmount();
    }
}

impl fmt::Debug for EntityList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityList")
            .field("memoize", &self.memoize)
            .field("items", &self.items.len())
            .finish()
    }
}

impl Ecs {
    /// Render one subtree per entity in `props.entities`.
    pub fn entities(&self, props: EntitiesProps) -> Result<Node> {
        let EntitiesProps {
            entities,
            memoize,
            children,
        } = props;

        let mut list = EntityList::new(self.clone(), memoize, children);
        list.sync(&entities.get())?;

        let list = Rc::new(RefCell::new(list));
        let list_render = list.clone();
        Ok(Node::new(
            move || {
                let current = entities.get();
                list_render.borrow_mut().sync(&current)
            },
            move || {
                // Items unmount outside the borrow.
                let items = list.borrow_mut().take_items();
                unmount_items(items);
            },
        ))
    }
}
