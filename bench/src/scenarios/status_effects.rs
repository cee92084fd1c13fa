//! Status effect churn: long-lived actors gaining and losing marker components.
//!
//! Every frame a random subset of actors toggles one of three status markers, which moves the
//! actor to a neighbouring archetype. Health is then drained across every burning or poisoned
//! archetype. This stresses:
//! - migration between archetypes (row take, location repair, row insert)
//! - archetype lookup as the number of signature combinations grows

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusty_archetypes::ecs::{Component, Entity, Signature, Storage};

use crate::components::{Burning, Frozen, Health, Poisoned, Position};
use crate::scenarios::Scenario;

/// Configuration for the status effect benchmark.
pub struct StatusEffectConfig {
    /// Number of actors.
    pub actor_count: usize,
    /// Fraction of actors toggling a status each frame.
    pub toggle_rate: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for StatusEffectConfig {
    fn default() -> Self {
        Self {
            actor_count: 10_000,
            toggle_rate: 0.1,
            seed: 4242,
        }
    }
}

pub struct StatusEffectScenario {
    config: StatusEffectConfig,
    storage: Storage,
    rng: ChaCha8Rng,
    actors: Vec<Entity>,
    burning: Signature,
    poisoned: Signature,
}

impl StatusEffectScenario {
    pub fn with_config(config: StatusEffectConfig) -> Self {
        let storage = Storage::new();
        let burning = storage.components().signature::<(Health, Burning)>();
        let poisoned = storage.components().signature::<(Health, Poisoned)>();
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            storage,
            rng,
            actors: Vec::new(),
            burning,
            poisoned,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn toggle(&mut self, entity: Entity, status: u8) {
        match status {
            0 => toggle_marker(&mut self.storage, entity, Burning),
            1 => toggle_marker(&mut self.storage, entity, Frozen),
            _ => toggle_marker(&mut self.storage, entity, Poisoned),
        }
    }

    fn drain(&mut self, query: &Signature, amount: f32) {
        for id in self.storage.find_matching(query) {
            if let Some(healths) = self.storage.slice_mut::<Health>(id) {
                for health in healths {
                    health.current = (health.current - amount).max(0.0);
                }
            }
        }
    }
}

fn toggle_marker<C: Component>(storage: &mut Storage, entity: Entity, marker: C) {
    if storage.has::<C>(entity) {
        let _ = storage.remove_component::<C>(entity);
    } else {
        let _ = storage.add_component(entity, marker);
    }
}

impl Scenario for StatusEffectScenario {
    fn name(&self) -> &'static str {
        "status_effects"
    }

    fn description(&self) -> &'static str {
        "Long-lived actors toggling status markers: archetype migration churn"
    }

    fn entity_count(&self) -> usize {
        self.storage.len()
    }

    fn setup(&mut self) {
        self.actors.reserve(self.config.actor_count);
        for i in 0..self.config.actor_count {
            let actor = (
                Position {
                    x: i as f32,
                    y: 0.0,
                    z: 0.0,
                },
                Health {
                    current: 100.0,
                    max: 100.0,
                },
            );
            if let Ok(entity) = self.storage.spawn(actor) {
                self.actors.push(entity);
            }
        }
    }

    fn update(&mut self) {
        if self.actors.is_empty() {
            return;
        }
        let toggles = (self.actors.len() as f64 * self.config.toggle_rate) as usize;
        for _ in 0..toggles {
            let entity = self.actors[self.rng.gen_range(0..self.actors.len())];
            let status = self.rng.gen_range(0..3);
            self.toggle(entity, status);
        }

        let burning = self.burning.clone();
        let poisoned = self.poisoned.clone();
        self.drain(&burning, 1.0);
        self.drain(&poisoned, 0.5);
    }

    fn teardown(&mut self) {
        for entity in self.actors.drain(..) {
            let _ = self.storage.destroy_entity(entity);
        }
    }
}
