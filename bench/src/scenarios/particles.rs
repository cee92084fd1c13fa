//! Particle churn: a fixed population of short-lived particles.
//!
//! Every frame integrates positions over all matching archetypes, ages each particle, destroys
//! the expired ones and spawns replacements. This stresses:
//! - spawn and destroy throughput, including the swap-remove location repair
//! - dense column iteration through [`Storage::slice`] and [`Storage::slice_mut`]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusty_archetypes::ecs::{Entity, Signature, Storage};

use crate::components::{Color, Lifetime, Position, Velocity};
use crate::scenarios::Scenario;

/// Configuration for the particle benchmark.
pub struct ParticleConfig {
    /// Number of particles kept alive.
    pub particle_count: usize,
    /// Simulated delta time per frame.
    pub delta_time: f32,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            particle_count: 100_000,
            delta_time: 1.0 / 60.0,
            seed: 12345,
        }
    }
}

pub struct ParticleScenario {
    config: ParticleConfig,
    storage: Storage,
    rng: ChaCha8Rng,
    particles: Vec<Entity>,
    moving: Signature,
    aging: Signature,
}

impl ParticleScenario {
    pub fn with_config(config: ParticleConfig) -> Self {
        let storage = Storage::new();
        let moving = storage.components().signature::<(Position, Velocity)>();
        let aging = storage.components().signature::<Lifetime>();
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            storage,
            rng,
            particles: Vec::new(),
            moving,
            aging,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn spawn_particle(&mut self) {
        let rng = &mut self.rng;
        let total = rng.gen_range(0.5..3.0);
        let particle = (
            Position {
                x: rng.gen_range(-100.0..100.0),
                y: rng.gen_range(-100.0..100.0),
                z: rng.gen_range(-100.0..100.0),
            },
            Velocity {
                x: rng.gen_range(-10.0..10.0),
                y: rng.gen_range(-10.0..10.0),
                z: rng.gen_range(-10.0..10.0),
            },
            Lifetime {
                remaining: total,
                total,
            },
            Color {
                r: rng.r#gen(),
                g: rng.r#gen(),
                b: rng.r#gen(),
                a: 1.0,
            },
        );
        if let Ok(entity) = self.storage.spawn(particle) {
            self.particles.push(entity);
        }
    }

    fn integrate(&mut self) {
        let dt = self.config.delta_time;
        for id in self.storage.find_matching(&self.moving) {
            let velocities = self.storage.slice::<Velocity>(id).unwrap_or(&[]).to_vec();
            if let Some(positions) = self.storage.slice_mut::<Position>(id) {
                for (position, velocity) in positions.iter_mut().zip(&velocities) {
                    position.x += velocity.x * dt;
                    position.y += velocity.y * dt;
                    position.z += velocity.z * dt;
                }
            }
        }
    }

    fn age(&mut self) {
        let dt = self.config.delta_time;
        for id in self.storage.find_matching(&self.aging) {
            if let Some(lifetimes) = self.storage.slice_mut::<Lifetime>(id) {
                for lifetime in lifetimes {
                    lifetime.remaining -= dt;
                }
            }
        }
    }

    fn expire(&mut self) -> usize {
        let storage = &mut self.storage;
        let before = self.particles.len();
        self.particles.retain(|&entity| {
            let expired = storage
                .get::<Lifetime>(entity)
                .is_none_or(|lifetime| lifetime.remaining <= 0.0);
            if expired {
                let _ = storage.destroy_entity(entity);
            }
            !expired
        });
        before - self.particles.len()
    }
}

impl Scenario for ParticleScenario {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn description(&self) -> &'static str {
        "Short-lived particles: spawn/destroy churn with column iteration"
    }

    fn entity_count(&self) -> usize {
        self.storage.len()
    }

    fn setup(&mut self) {
        self.particles.reserve(self.config.particle_count);
        for _ in 0..self.config.particle_count {
            self.spawn_particle();
        }
    }

    fn update(&mut self) {
        self.integrate();
        self.age();
        let expired = self.expire();
        for _ in 0..expired {
            self.spawn_particle();
        }
    }

    fn teardown(&mut self) {
        for entity in self.particles.drain(..) {
            let _ = self.storage.destroy_entity(entity);
        }
    }
}
