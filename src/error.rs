//! Error types for store mutations and binder usage.

use thiserror::Error;

use crate::store::EntityId;

/// Errors raised by a [`Store`](crate::store::Store) mutation.
///
/// These belong to the store's contract. Binders never catch or translate
/// them; they surface to whoever mounted the tree through [`BindError::Store`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The entity has been destroyed (or never belonged to this store).
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity already carries a component with this name.
    #[error("Entity {entity} already has component '{name}'")]
    DuplicateComponent {
        /// Target entity.
        entity: EntityId,
        /// Component name.
        name: String,
    },

    /// The entity carries no component with this name.
    #[error("Entity {entity} has no component '{name}'")]
    MissingComponent {
        /// Target entity.
        entity: EntityId,
        /// Component name.
        name: String,
    },
}

/// Errors raised while mounting or re-rendering binders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A component binder was mounted outside of any entity binder.
    #[error("Component '{component}' used outside of an entity binder")]
    NoEntityContext {
        /// Component name.
        component: String,
    },

    /// The child-supplied form was given more than one child.
    #[error("Component '{component}' accepts a single child, got {count}")]
    MultipleChildren {
        /// Component name.
        component: String,
        /// Number of children supplied.
        count: usize,
    },

    /// The child-supplied form was given no child at all.
    #[error("Component '{component}' needs a child to supply its value")]
    MissingChild {
        /// Component name.
        component: String,
    },

    /// The child finished its setup without filling the component reference.
    #[error("Child of component '{component}' never set its value")]
    UnsetRef {
        /// Component name.
        component: String,
    },

    /// A store mutation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias used throughout the binders.
pub type Result<T> = std::result::Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts() {
        let err: BindError = StoreError::EntityNotFound(EntityId(7)).into();
        assert_eq!(err, BindError::Store(StoreError::EntityNotFound(EntityId(7))));
        assert_eq!(err.to_string(), "Entity not found: e7");
    }

    #[test]
    fn test_usage_error_messages() {
        let err = BindError::MultipleChildren {
            component: "mesh".into(),
            count: 2,
        };
        assert_eq!(err.to_string(), "Component 'mesh' accepts a single child, got 2");
    }
}
