//! Component binder - attach one named component to the ambient entity.
//!
//! The value comes from exactly one source:
//! - [`ComponentSource::Data`] - a prop, re-applied whenever its identity changes
//! - [`ComponentSource::Children`] - a single child that fills a
//!   [`ComponentRef`] during its own setup; attached after that setup and
//!   re-applied only when the name changes
//!
//! The entity is the ambient entity at mount. It stays fixed for the
//! binder's life, like the entity binder that provides it.
//!
//! Detaching checks that the entity still exists first: an ancestor may
//! already have destroyed it earlier in the same teardown.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use super::Ecs;
use crate::error::{BindError, Result};
use crate::runtime::{current_entity, Cleanup, KeyedEffect, Node, PropValue};
use crate::store::{ComponentValue, Entity, Store};

// =============================================================================
// Component Ref
// =============================================================================

/// Slot a child fills with the component value it produces.
#[derive(Clone, Default)]
pub struct ComponentRef(Rc<RefCell<Option<ComponentValue>>>);

impl ComponentRef {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the value.
    pub fn set(&self, value: ComponentValue) {
        *self.0.borrow_mut() = Some(value);
    }

    /// Current value, if set.
    pub fn get(&self) -> Option<ComponentValue> {
        self.0.borrow().clone()
    }

    /// Whether a value has been stored.
    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.get()).finish()
    }
}

// =============================================================================
// Props
// =============================================================================

/// A child that supplies a component value through a [`ComponentRef`].
pub type RefChild = Box<dyn FnOnce(&Entity, &ComponentRef) -> Result<Node>>;

/// Where a component's value comes from.
pub enum ComponentSource {
    /// Literal value prop.
    Data(PropValue<ComponentValue>),
    /// Child subtree that fills the value. Exactly one is allowed.
    Children(Vec<RefChild>),
}

/// Props for [`Ecs::component`].
pub struct ComponentProps {
    /// Component name.
    pub name: PropValue<String>,
    /// Value source.
    pub source: ComponentSource,
}

impl ComponentProps {
    /// Literal value form.
    pub fn data(
        name: impl Into<PropValue<String>>,
        value: impl Into<PropValue<ComponentValue>>,
    ) -> Self {
        Self {
            name: name.into(),
            source: ComponentSource::Data(value.into()),
        }
    }

    /// Child-supplied form with a single child.
    pub fn child(
        name: impl Into<PropValue<String>>,
        child: impl FnOnce(&Entity, &ComponentRef) -> Result<Node> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            source: ComponentSource::Children(vec![Box::new(child)]),
        }
    }

    /// Child-supplied form with an explicit child list.
    pub fn children(name: impl Into<PropValue<String>>, children: Vec<RefChild>) -> Self {
        Self {
            name: name.into(),
            source: ComponentSource::Children(children),
        }
    }
}

// =============================================================================
// Attach / Detach
// =============================================================================

fn attach(
    store: &Rc<dyn Store>,
    entity: &Entity,
    name: &str,
    value: ComponentValue,
) -> Result<Option<Cleanup>> {
    store.add_component(entity, name, value)?;
    debug!(entity = %entity.id(), component = name, "component attached");

    let store = store.clone();
    let entity = entity.clone();
    let name = name.to_string();
    Ok(Some(Box::new(move || detach(&store, &entity, &name)) as Cleanup))
}

fn detach(store: &Rc<dyn Store>, entity: &Entity, name: &str) {
    if !store.contains(entity) {
        trace!(entity = %entity.id(), component = name, "entity already destroyed, skipping detach");
        return;
    }
    match store.remove_component(entity, name) {
        Ok(()) => debug!(entity = %entity.id(), component = name, "component detached"),
        Err(err) => warn!(entity = %entity.id(), component = name, %err, "detach failed"),
    }
}

// =============================================================================
// Binder
// =============================================================================

impl Ecs {
    /// Mount a component binder on the ambient entity.
    ///
    /// Fails with [`BindError::NoEntityContext`] outside of an entity binder,
    /// and with [`BindError::MultipleChildren`] / [`BindError::MissingChild`]
    /// when the child-supplied form does not get exactly one child.
    pub fn component(&self, props: ComponentProps) -> Result<Node> {
        let ComponentProps { name, source } = props;
        let initial_name = name.get();

        let Some(entity) = current_entity() else {
            error!(component = %initial_name, "component used outside of an entity binder");
            return Err(BindError::NoEntityContext {
                component: initial_name,
            });
        };

        match source {
            ComponentSource::Data(value) => self.mount_data(entity, name, value),
            ComponentSource::Children(children) => {
                self.mount_child(entity, name, initial_name, children)
            }
        }
    }

    fn mount_data(
        &self,
        entity: Entity,
        name: PropValue<String>,
        value: PropValue<ComponentValue>,
    ) -> Result<Node> {
        let store = self.store.clone();

        let mut effect: KeyedEffect<(Entity, String, ComponentValue)> = KeyedEffect::new();
        effect.run((entity.clone(), name.get(), value.get()), |(entity, name, value)| {
            attach(&store, entity, name, value.clone())
        })?;

        let effect = Rc::new(RefCell::new(effect));
        let effect_render = effect.clone();

        Ok(Node::new(
            move || {
                // The ambient entity is fixed at mount: a triggered re-render
                // may run while another binder's entity is on the stack.
                let key = (entity.clone(), name.get(), value.get());
                effect_render
                    .borrow_mut()
                    .run(key, |(entity, name, value)| {
                        attach(&store, entity, name, value.clone())
                    })
                    .map(|_| ())
            },
            move || effect.borrow_mut().dispose(),
        ))
    }

    fn mount_child(
        &self,
        entity: Entity,
        name: PropValue<String>,
        initial_name: String,
        children: Vec<RefChild>,
    ) -> Result<Node> {
        if children.len() > 1 {
            error!(component = %initial_name, count = children.len(), "component accepts a single child");
            return Err(BindError::MultipleChildren {
                component: initial_name,
                count: children.len(),
            });
        }
        let Some(child) = children.into_iter().next() else {
            error!(component = %initial_name, "component needs a child to supply its value");
            return Err(BindError::MissingChild {
                component: initial_name,
            });
        };

        // The child's own setup runs first and fills the slot.
        let slot = ComponentRef::new();
        let child_node = child(&entity, &slot)?;

        let store = self.store.clone();
        let attach_from_slot = {
            let slot = slot.clone();
            move |(entity, name): &(Entity, String)| match slot.get() {
                Some(value) => attach(&store, entity, name, value),
                None => Err(BindError::UnsetRef {
                    component: name.clone(),
                }),
            }
        };

        let mut effect: KeyedEffect<(Entity, String)> = KeyedEffect::new();
        effect.run((entity.clone(), initial_name), &attach_from_slot)?;

        let state = Rc::new(RefCell::new((effect, Some(child_node))));
        let state_render = state.clone();

        Ok(Node::new(
            move || {
                let mut state = state_render.borrow_mut();
                let (effect, child) = &mut *state;
                if let Some(child) = child.as_mut() {
                    child.rerender()?;
                }
                effect
                    .run((entity.clone(), name.get()), &attach_from_slot)
                    .map(|_| ())
            },
            move || {
                let child = {
                    let mut state = state.borrow_mut();
                    state.0.dispose();
                    state.1.take()
                };
                if let Some(child) = child {
                    child.unmount();
                }
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::EntityProps;
    use crate::runtime::{reset_entity_context, value, Rerender};
    use crate::store::World;
    use spark_signals::signal;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    fn setup() -> (Rc<World>, Ecs) {
        reset_entity_context();
        let world = Rc::new(World::new());
        (world.clone(), Ecs::new(world))
    }

    fn only_entity(world: &World) -> Entity {
        let entities = world.entities();
        assert_eq!(entities.len(), 1);
        entities[0].clone()
    }

    #[test]
    fn test_attaches_and_detaches_data() {
        let (world, ecs) = setup();

        let ecs_child = ecs.clone();
        let node = ecs
            .entity(EntityProps::with_children(move |_| {
                ecs_child.component(ComponentProps::data("health", value(Health(10))))
            }))
            .unwrap();

        let entity = only_entity(&world);
        assert_eq!(entity.get_as::<Health>("health").as_deref(), Some(&Health(10)));

        node.unmount();
        assert!(!world.contains(&entity));
    }

    #[test]
    fn test_detach_on_supplied_entity() {
        let (world, ecs) = setup();
        let entity = world.create_entity();

        let ecs_child = ecs.clone();
        let node = ecs
            .entity(EntityProps::existing(entity.clone()).children(move |_| {
                ecs_child.component(ComponentProps::data("health", value(Health(1))))
            }))
            .unwrap();
        assert!(entity.has("health"));

        node.unmount();
        assert!(world.contains(&entity));
        assert!(!entity.has("health"), "binder removes what it attached");
    }

    #[test]
    fn test_outside_entity_is_usage_error() {
        let (_world, ecs) = setup();

        let err = ecs
            .component(ComponentProps::data("health", value(Health(1))))
            .unwrap_err();
        assert_eq!(
            err,
            BindError::NoEntityContext {
                component: "health".into()
            }
        );
    }

    #[test]
    fn test_value_identity_change_reattaches() {
        let (world, ecs) = setup();
        let health = signal(ComponentValue::new(Health(10)));

        let ecs_child = ecs.clone();
        let health_prop = health.clone();
        let mut node = ecs
            .entity(EntityProps::with_children(move |_| {
                ecs_child.component(ComponentProps::data("health", health_prop))
            }))
            .unwrap();
        let entity = only_entity(&world);

        health.set(ComponentValue::new(Health(20)));
        node.rerender().unwrap();
        assert_eq!(entity.get_as::<Health>("health").as_deref(), Some(&Health(20)));
    }

    #[test]
    fn test_name_change_moves_component() {
        let (world, ecs) = setup();
        let name = signal("hp".to_string());

        let ecs_child = ecs.clone();
        let name_prop = name.clone();
        let mut node = ecs
            .entity(EntityProps::with_children(move |_| {
                ecs_child.component(ComponentProps::data(name_prop, value(Health(3))))
            }))
            .unwrap();
        let entity = only_entity(&world);
        assert!(entity.has("hp"));

        name.set("health".to_string());
        node.rerender().unwrap();
        assert_eq!(entity.component_names(), vec!["health".to_string()]);
    }

    #[test]
    fn test_child_supplies_value() {
        let (world, ecs) = setup();

        let ecs_child = ecs.clone();
        let _node = ecs
            .entity(EntityProps::with_children(move |_| {
                ecs_child.component(ComponentProps::child("mesh", |_entity, slot| {
                    slot.set(ComponentValue::new("cube"));
                    Ok(Node::empty())
                }))
            }))
            .unwrap();

        let entity = only_entity(&world);
        assert_eq!(entity.get_as::<&str>("mesh").as_deref(), Some(&"cube"));
    }

    #[test]
    fn test_child_attach_waits_for_child_setup() {
        let (_world, ecs) = setup();

        let ecs_child = ecs.clone();
        let _node = ecs
            .entity(EntityProps::with_children(move |_| {
                ecs_child.component(ComponentProps::child("mesh", |entity, slot| {
                    assert!(!entity.has("mesh"), "not attached before the child ran");
                    slot.set(ComponentValue::new(1u8));
                    Ok(Node::empty())
                }))
            }))
            .unwrap();
    }

    #[test]
    fn test_multiple_children_fail_fast() {
        let (world, ecs) = setup();

        let ecs_child = ecs.clone();
        let err = ecs
            .entity(EntityProps::with_children(move |_| {
                let first: RefChild = Box::new(|_: &Entity, slot: &ComponentRef| {
                    slot.set(ComponentValue::new(1u8));
                    Ok(Node::empty())
                });
                let second: RefChild = Box::new(|_: &Entity, _: &ComponentRef| Ok(Node::empty()));
                ecs_child.component(ComponentProps::children("mesh", vec![first, second]))
            }))
            .unwrap_err();

        assert_eq!(
            err,
            BindError::MultipleChildren {
                component: "mesh".into(),
                count: 2
            }
        );
        assert_eq!(world.len(), 0);
    }

    #[test]
    fn test_unset_ref_is_error() {
        let (_world, ecs) = setup();

        let ecs_child = ecs.clone();
        let err = ecs
            .entity(EntityProps::with_children(move |_| {
                ecs_child.component(ComponentProps::child("mesh", |_, _| Ok(Node::empty())))
            }))
            .unwrap_err();

        assert_eq!(
            err,
            BindError::UnsetRef {
                component: "mesh".into()
            }
        );
    }

    #[test]
    fn test_detach_skipped_for_destroyed_entity() {
        let (world, ecs) = setup();
        let entity = world.create_entity();

        let ecs_child = ecs.clone();
        let node = ecs
            .entity(EntityProps::existing(entity.clone()).children(move |_| {
                ecs_child.component(ComponentProps::data("health", value(Health(1))))
            }))
            .unwrap();

        // Someone else destroys the entity before the binder unmounts.
        world.destroy_entity(&entity);
        node.unmount();

        assert!(!world.contains(&entity));
    }

    #[test]
    fn test_duplicate_add_propagates_store_error() {
        let (world, ecs) = setup();
        let entity = world.create_entity();
        world
            .add_component(&entity, "health", ComponentValue::new(Health(1)))
            .unwrap();

        let ecs_child = ecs.clone();
        let err = ecs
            .entity(EntityProps::existing(entity.clone()).children(move |_| {
                ecs_child.component(ComponentProps::data("health", value(Health(2))))
            }))
            .unwrap_err();

        assert!(matches!(
            err,
            BindError::Store(crate::error::StoreError::DuplicateComponent { .. })
        ));
        assert_eq!(entity.get_as::<Health>("health").as_deref(), Some(&Health(1)));
    }

    #[test]
    fn test_triggered_rerender_keeps_component_on_its_entity() {
        let (world, ecs) = setup();
        let a = world.create_entity();
        let b = world.create_entity();

        // Under A: a health component re-rendered whenever "enemy" changes.
        let ecs_a = ecs.clone();
        let node_a = ecs
            .entity(EntityProps::existing(a.clone()).children(move |_| {
                let health = ecs_a.component(ComponentProps::data("health", value(Health(7))))?;
                let health = Rc::new(RefCell::new(Some(health)));
                let health_render = health.clone();
                let rerender = Rerender::with_render(move || {
                    match health_render.borrow_mut().as_mut() {
                        Some(node) => node.rerender(),
                        None => Ok(()),
                    }
                });
                let subscription = ecs_a.use_archetype("enemy", &rerender)?;
                Ok(Node::from_cleanup(move || {
                    subscription.unsubscribe();
                    rerender.dispose();
                    let node = health.borrow_mut().take();
                    if let Some(node) = node {
                        node.unmount();
                    }
                }))
            }))
            .unwrap();

        // Tagging B fires the subscription while B is the ambient entity.
        let ecs_b = ecs.clone();
        let _node_b = ecs
            .entity(EntityProps::existing(b.clone()).children(move |_| {
                ecs_b.component(ComponentProps::data("enemy", ComponentValue::tag()))
            }))
            .unwrap();

        assert!(a.has("health"));
        assert_eq!(b.component_names(), vec!["enemy".to_string()]);

        node_a.unmount();
        assert!(!a.has("health"));
    }
}
