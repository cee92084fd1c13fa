//! # rusty_archetypes
//!
//! Archetype-based component storage. Entities are grouped by the exact set of component
//! types they own, and every group stores each component type in its own dense column so
//! that iterating a component combination only touches contiguous, homogeneous memory.
//!
//! The entry point is [`ecs::Storage`]; see the [`ecs`] module for the building blocks.

// Lets `#[derive(Component)]` emit `::rusty_archetypes::...` paths inside this crate too.
extern crate self as rusty_archetypes;

pub mod ecs;
