//! Storage scenario benchmarks using Criterion.
//!
//! - Particle churn (spawn/destroy with column iteration)
//! - Status effects (archetype migration churn)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rusty_bench::{
    memory::HeapSession,
    scenarios::{
        ParticleConfig, ParticleScenario, Scenario, StatusEffectConfig, StatusEffectScenario,
    },
};

#[cfg(feature = "memory_profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

// =============================================================================
// Particle Benchmarks
// =============================================================================

fn bench_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario/particles");

    for count in [10_000, 50_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("frame", count), &count, |b, &n| {
            let mut scenario = ParticleScenario::with_config(ParticleConfig {
                particle_count: n,
                ..Default::default()
            });
            scenario.setup();

            b.iter(|| {
                scenario.update();
            });
        });
    }

    group.finish();
}

// =============================================================================
// Status Effect Benchmarks
// =============================================================================

fn bench_status_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario/status_effects");

    for rate in [0.01, 0.1, 0.5] {
        let config = StatusEffectConfig {
            toggle_rate: rate,
            ..Default::default()
        };
        let toggles = (config.actor_count as f64 * rate) as u64;
        group.throughput(Throughput::Elements(toggles));

        group.bench_with_input(BenchmarkId::new("frame", rate), &rate, |b, &rate| {
            let mut scenario = StatusEffectScenario::with_config(StatusEffectConfig {
                toggle_rate: rate,
                ..Default::default()
            });
            scenario.setup();

            b.iter(|| {
                scenario.update();
            });
        });
    }

    group.finish();
}

// =============================================================================
// Memory Report
// =============================================================================

fn report_memory(_c: &mut Criterion) {
    let mut scenarios: Vec<Box<dyn Scenario>> = vec![
        Box::new(ParticleScenario::with_config(ParticleConfig::default())),
        Box::new(StatusEffectScenario::with_config(StatusEffectConfig::default())),
    ];

    let session = HeapSession::start();
    for scenario in &mut scenarios {
        let ((), stats) = session.measure(|| scenario.setup());
        let entities = scenario.entity_count();
        println!(
            "{}: {} entities, {} ({:.1} bytes/entity)",
            scenario.name(),
            entities,
            stats,
            stats.bytes_per_entity(entities)
        );
        scenario.teardown();
    }
}

criterion_group!(
    benches,
    bench_particles,
    bench_status_effects,
    report_memory
);
criterion_main!(benches);
