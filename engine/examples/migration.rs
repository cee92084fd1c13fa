//! Walks a handful of entities through the structural changes of the storage engine and prints
//! where each one lives after every step.
//!
//! Run with `RUST_LOG=trace cargo run --example migration` to also see the engine's own logging.

use rusty_archetypes::ecs::{Entity, Result, Signature, Storage, storage::Location};
use rusty_macros::Component;

#[derive(Component, Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Component, Debug)]
struct Frozen;

fn describe(storage: &Storage, label: &str, entity: Entity) {
    match storage.get_location(entity) {
        Some(location) => println!("{label:>8}: {}", place(storage, location)),
        None => println!("{label:>8}: <not stored>"),
    }
}

fn place(storage: &Storage, location: Location) -> String {
    let Some(archetype) = storage.archetype(location.archetype_id()) else {
        return format!("{location:?}");
    };
    let names: Vec<_> = archetype
        .signature()
        .iter()
        .filter_map(|id| storage.components().info(*id))
        .map(|info| info.name().rsplit("::").next().unwrap_or(info.name()))
        .collect();
    format!(
        "archetype {} {{{}}} row {}",
        location.archetype_id().index(),
        names.join(", "),
        location.row().index()
    )
}

fn step(storage: &mut Storage, dt: f32) {
    let query = storage.components().signature::<(Position, Velocity)>();
    for id in storage.find_matching(&query) {
        let velocities = storage.slice::<Velocity>(id).unwrap_or(&[]).to_vec();
        if let Some(positions) = storage.slice_mut::<Position>(id) {
            for (position, velocity) in positions.iter_mut().zip(&velocities) {
                position.x += velocity.dx * dt;
                position.y += velocity.dy * dt;
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut storage = Storage::new();

    let walker = storage.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.5 }))?;
    let rock = storage.spawn(Position { x: 3.0, y: 3.0 })?;
    let drone = storage
        .builder()
        .with(Position { x: -2.0, y: 1.0 })
        .with(Velocity { dx: 0.0, dy: -1.0 })
        .build()?;

    println!("-- spawned");
    for (label, entity) in [("walker", walker), ("rock", rock), ("drone", drone)] {
        describe(&storage, label, entity);
    }

    step(&mut storage, 1.0);
    println!("-- after one step");
    println!("  walker at {:?}", storage.get::<Position>(walker));
    println!("  drone at {:?}", storage.get::<Position>(drone));

    storage.add_component(walker, Frozen)?;
    let velocity = storage.remove_component::<Velocity>(walker)?;
    println!("-- walker frozen, dropped {velocity:?}");
    for (label, entity) in [("walker", walker), ("rock", rock), ("drone", drone)] {
        describe(&storage, label, entity);
    }

    storage.destroy_entity(drone)?;
    println!("-- drone destroyed");
    describe(&storage, "drone", drone);

    let moving = storage.components().signature::<Velocity>();
    println!(
        "-- archetypes with velocity and entities: {:?}",
        storage.find_matching(&moving)
    );
    println!(
        "-- {} entities in {} archetypes",
        storage.len(),
        storage.archetypes().len()
    );
    let everything: Signature = Signature::EMPTY;
    for id in storage.archetypes().find_matching(&everything) {
        if let Some(archetype) = storage.archetype(id) {
            println!("  {:?}: {} rows", archetype.signature().ids(), archetype.len());
        }
    }

    Ok(())
}
