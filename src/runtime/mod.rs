//! Runtime - lifecycle primitives the binders are built on.
//!
//! - [`Node`] - a mounted subtree with re-render and unmount
//! - [`KeyedEffect`] - setup/teardown re-run exactly when a key changes
//! - [`Rerender`] - re-render trigger with a reactive version signal
//! - [`PropValue`] - static / signal / getter props
//! - entity context - the ambient "current entity" stack
//!
//! # Pattern: Mount, Re-render, Unmount
//!
//! Binders are plain functions. Calling one mounts it: props are read,
//! setup runs, children mount. The returned [`Node`] re-reads props on
//! `rerender()` and tears everything down on `unmount()` (or drop).
//!
//! ```ignore
//! let mut node = ecs.entity(EntityProps::default())?;
//! node.rerender()?; // entity unchanged, keyed setups skipped
//! node.unmount();   // owned entity destroyed
//! ```

mod context;
mod keyed;
mod node;
mod props;
mod rerender;

pub use context::{
    current_entity, entity_context_depth, pop_entity_context, push_entity_context,
    reset_entity_context, with_entity_context,
};
pub use keyed::KeyedEffect;
pub use node::{Cleanup, Node, RenderFn};
pub use props::{value, PropValue};
pub use rerender::{Rerender, MAX_RERENDER_PASSES};
