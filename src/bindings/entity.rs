//! Entity binder - one node, one entity.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::Ecs;
use crate::error::Result;
use crate::runtime::{with_entity_context, Cleanup, KeyedEffect, Node};
use crate::store::{Entity, EntityId, Store};

/// Children of an entity binder. Receives the bound entity, which is also
/// the ambient entity while children mount.
pub type Children = Box<dyn FnOnce(&Entity) -> Result<Node>>;

/// Props for [`Ecs::entity`].
#[derive(Default)]
pub struct EntityProps {
    /// Existing entity to represent. `None` creates and owns a fresh one.
    pub entity: Option<Entity>,
    /// Subtree mounted under the entity.
    pub children: Option<Children>,
}

impl EntityProps {
    /// Fresh owned entity with `children`.
    pub fn with_children(children: impl FnOnce(&Entity) -> Result<Node> + 'static) -> Self {
        Self {
            entity: None,
            children: Some(Box::new(children)),
        }
    }

    /// Represent `entity` without taking ownership.
    pub fn existing(entity: Entity) -> Self {
        Self {
            entity: Some(entity),
            children: None,
        }
    }

    /// Set the children.
    pub fn children(mut self, children: impl FnOnce(&Entity) -> Result<Node> + 'static) -> Self {
        self.children = Some(Box::new(children));
        self
    }
}

impl Ecs {
    /// Mount an entity binder.
    ///
    /// The entity is resolved once, before any child mounts, and stays fixed
    /// for the node's lifetime. Only an entity created here is destroyed on
    /// unmount.
    pub fn entity(&self, props: EntityProps) -> Result<Node> {
        let EntityProps {
            entity: existing,
            children,
        } = props;

        let owned = existing.is_none();
        let entity = match existing {
            Some(entity) => entity,
            None => self.store.create_entity(),
        };

        // Ownership is released on unmount, or right away if a child fails.
        let mut ownership: KeyedEffect<EntityId> = KeyedEffect::new();
        ownership.run(entity.id(), |_| {
            if !owned {
                return Ok(None);
            }
            let store = self.store.clone();
            let entity = entity.clone();
            Ok(Some(Box::new(move || {
                if store.contains(&entity) {
                    store.destroy_entity(&entity);
                    debug!(entity = %entity.id(), "owned entity released");
                }
            }) as Cleanup))
        })?;

        let child = match children {
            Some(children) => with_entity_context(&entity, || children(&entity))?,
            None => Node::empty(),
        };

        let child = Rc::new(RefCell::new(Some(child)));
        let child_render = child.clone();
        let entity_render = entity;

        Ok(Node::new(
            move || {
                let mut child = child_render.borrow_mut();
                match child.as_mut() {
                    Some(child) => with_entity_context(&entity_render, || child.rerender()),
                    None => Ok(()),
                }
            },
            move || {
                let node = child.borrow_mut().take();
                if let Some(node) = node {
                    node.unmount();
                }
                ownership.dispose();
            },
        ))
    }

    /// Mount an entity binder whose subtree ignores parent re-renders.
    ///
    /// The bound entity is fixed for the node's lifetime, so nothing a parent
    /// passes down can change it; the subtree only re-renders on remount.
    pub fn memoized_entity(&self, props: EntityProps) -> Result<Node> {
        let inner = self.entity(props)?;
        Ok(Node::from_cleanup(move || inner.unmount()))
    }
}
