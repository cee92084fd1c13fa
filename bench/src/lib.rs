//! Benchmarks for the archetype storage engine.
//!
//! - **Microbenchmarks** (`benches/storage_micro.rs`): spawn, migration, destroy, and archetype
//!   matching in isolation
//! - **Scenarios** (`benches/storage_scenarios.rs`): seeded workloads mixing structural changes
//!   with column iteration, see [`scenarios`]
//! - **Memory tracking**: heap allocation profiling via dhat, see [`memory`]
//!
//! ```bash
//! cargo bench -p rusty_bench
//! cargo bench -p rusty_bench -- migration
//! cargo bench -p rusty_bench --features memory_profiling
//! ```
//!
//! Criterion writes HTML reports to `target/criterion/`.

pub mod components;
pub mod memory;
pub mod scenarios;
