//! # spark-ecs
//!
//! Reactive bindings between a declarative node tree and an entity-component
//! store.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactive props and re-render versions.
//!
//! ## Architecture
//!
//! Tree lifecycle events map onto store mutations, and store events map onto
//! re-render requests:
//! ```text
//! entity() ──creates──▶ Entity ◀──attaches── component()
//!                         │
//!                    Store archetypes ──added/removed──▶ use_archetype() ──▶ entities()
//!                         ▲                                       ▲
//!                         └────────── collection() ───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - Entities, archetypes, the [`Store`] contract and the [`World`] store
//! - [`runtime`] - Nodes, keyed setup/teardown, re-render triggers, entity context
//! - [`bindings`] - The binders, bundled on [`Ecs`]
//! - [`error`] - Usage and store errors

pub mod bindings;
pub mod error;
pub mod runtime;
pub mod store;

pub use bindings::{
    ArchetypeSubscription, Children, CollectionProps, ComponentProps, ComponentRef,
    ComponentSource, Ecs, EntitiesProps, EntityProps, ItemChildren, RefChild,
};

pub use error::{BindError, Result, StoreError};

pub use runtime::{
    current_entity, reset_entity_context, value, with_entity_context, Cleanup, KeyedEffect,
    Node, PropValue, Rerender, MAX_RERENDER_PASSES,
};

pub use store::{
    Archetype, ArchetypeEvents, ComponentValue, Entity, EntityId, Listener, Query, Store, Tag,
    World,
};
