//! Ambient entity context.
//!
//! A stack of "current entity" bindings. Entity binders push their entity
//! before mounting or re-rendering children and pop it afterwards; component
//! binders read the top. Nested entity binders shadow outer ones for their
//! own subtree.
//!
//! Re-renders that happen later (triggered by archetype changes) re-push the
//! entity captured at mount time, so the stack is always correct for the
//! subtree being rendered.

use std::cell::RefCell;

use crate::store::Entity;

thread_local! {
    /// Stack of entities for nested binders.
    static ENTITY_STACK: RefCell<Vec<Entity>> = const { RefCell::new(Vec::new()) };
}

/// Current ambient entity, if any binder is in scope.
pub fn current_entity() -> Option<Entity> {
    ENTITY_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Push an entity onto the stack.
pub fn push_entity_context(entity: Entity) {
    ENTITY_STACK.with(|stack| stack.borrow_mut().push(entity));
}

/// Pop the innermost entity.
pub fn pop_entity_context() {
    ENTITY_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
}

/// Run `f` with `entity` as the ambient entity.
pub fn with_entity_context<R>(entity: &Entity, f: impl FnOnce() -> R) -> R {
    push_entity_context(entity.clone());
    let result = f();
    pop_entity_context();
    result
}

/// Depth of the stack.
pub fn entity_context_depth() -> usize {
    ENTITY_STACK.with(|stack| stack.borrow().len())
}

/// Clear the stack (for testing).
pub fn reset_entity_context() {
    ENTITY_STACK.with(|stack| stack.borrow_mut().clear());
}
