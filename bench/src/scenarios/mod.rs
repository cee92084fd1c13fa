//! Seeded storage workloads with representative entity counts.
//!
//! # Scenarios
//!
//! - **Particles**: many short-lived entities, spawn/destroy churn plus column iteration
//! - **Status effects**: long-lived entities toggling marker components, migration churn

pub mod particles;
pub mod status_effects;

pub use particles::{ParticleConfig, ParticleScenario};
pub use status_effects::{StatusEffectConfig, StatusEffectScenario};

/// Common trait for benchmark scenarios.
pub trait Scenario {
    /// Human-readable name of the scenario.
    fn name(&self) -> &'static str;

    /// Brief description of what this scenario tests.
    fn description(&self) -> &'static str;

    /// Number of entities currently stored.
    fn entity_count(&self) -> usize;

    /// Set up the scenario (spawn entities, initialize state).
    fn setup(&mut self);

    /// Run one "frame" of the scenario.
    fn update(&mut self);

    /// Clean up the scenario.
    fn teardown(&mut self);
}
