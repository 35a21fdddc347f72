//! Enemies Example - a collection binder over a shared world
//!
//! This example demonstrates:
//! - Provisioning tagged entities with a collection
//! - Attaching components to each member from its subtree
//! - Reacting to entities tagged from outside the tree
//! - Tearing everything down on unmount
//!
//! Run with: cargo run --example enemies

use std::rc::Rc;

use spark_ecs::{
    value, CollectionProps, ComponentProps, ComponentValue, Ecs, Query, Rerender, Store, World,
};
use spark_signals::signal;

#[derive(Debug)]
struct Health(u32);

fn main() -> spark_ecs::Result<()> {
    let world = Rc::new(World::new());
    let ecs = Ecs::new(world.clone());

    println!("=== spark-ecs Enemies Example ===\n");

    // Every member gets a health component while it is rendered.
    let ecs_child = ecs.clone();
    let initial = signal(3usize);
    let mut node = ecs.collection(
        CollectionProps::new("enemy", initial.clone()).children(move |entity| {
            println!("  render enemy {}", entity.id());
            ecs_child.component(ComponentProps::data("health", value(Health(100))))
        }),
    )?;

    let enemies = world.archetype(&Query::from("enemy"));
    println!("After mount: {} enemies", enemies.len());

    // A HUD counter subscribed to the same archetype.
    let hud = {
        let enemies = enemies.clone();
        Rerender::with_render(move || {
            println!("  hud: {} enemies on screen", enemies.len());
            Ok(())
        })
    };
    let _hud = ecs.use_archetype("enemy", &hud)?;

    // Spawned by game logic, not by the tree.
    println!("\nSpawning a boss outside the tree:");
    let boss = world.create_entity();
    world.add_component(&boss, "enemy", ComponentValue::tag())?;
    println!("After spawn: {} enemies", enemies.len());

    for entity in enemies.entities() {
        let health = entity.get_as::<Health>("health");
        println!("  {} health = {:?}", entity.id(), health.map(|h| h.0));
    }

    println!("\nReprovisioning with 5 enemies:");
    initial.set(5);
    node.rerender()?;
    println!("After rerender: {} enemies", enemies.len());

    println!("\nUnmounting the collection:");
    node.unmount();
    println!("After unmount: {} enemies, {} entities", enemies.len(), world.len());

    Ok(())
}
