//! Heap profiling for benchmark workloads, backed by dhat.
//!
//! Profiling adds overhead and is only compiled in with the `memory_profiling` feature:
//!
//! ```bash
//! cargo bench -p rusty_bench --features memory_profiling
//! ```
//!
//! The bench binary must then install `dhat::Alloc` as its global allocator. The detailed
//! profile is written to `dhat-heap.json`; load it in
//! <https://nnethercote.github.io/dh_view/dh_view.html>.

use std::fmt;

/// Heap usage captured over one measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Total bytes allocated.
    pub bytes_allocated: u64,
    /// Total number of allocations.
    pub allocation_count: u64,
    /// Peak live heap in bytes.
    pub peak_bytes: u64,
}

impl MemoryStats {
    /// Bytes allocated per stored entity.
    pub fn bytes_per_entity(&self, entities: usize) -> f64 {
        per(self.bytes_allocated, entities)
    }

    /// Allocations per stored entity.
    pub fn allocations_per_entity(&self, entities: usize) -> f64 {
        per(self.allocation_count, entities)
    }
}

fn per(total: u64, entities: usize) -> f64 {
    if entities == 0 {
        0.0
    } else {
        total as f64 / entities as f64
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocated: {} bytes ({} allocs), peak: {} bytes",
            self.bytes_allocated, self.allocation_count, self.peak_bytes
        )
    }
}

/// A heap profiling session spanning several measurements.
///
/// dhat allows a single profiler per process, so one session is started up front and each
/// [`HeapSession::measure`] reports the difference in totals across its closure. The peak is the
/// session-wide maximum at the time the closure returns.
pub struct HeapSession {
    #[cfg(feature = "memory_profiling")]
    _profiler: dhat::Profiler,
}

impl HeapSession {
    /// Start profiling. Without the `memory_profiling` feature nothing is tracked.
    pub fn start() -> Self {
        Self {
            #[cfg(feature = "memory_profiling")]
            _profiler: dhat::Profiler::new_heap(),
        }
    }

    /// Run `f` and report the heap activity it caused.
    pub fn measure<R>(&self, f: impl FnOnce() -> R) -> (R, MemoryStats) {
        let before = snapshot();
        let result = f();
        let after = snapshot();
        (
            result,
            MemoryStats {
                bytes_allocated: after.bytes_allocated - before.bytes_allocated,
                allocation_count: after.allocation_count - before.allocation_count,
                peak_bytes: after.peak_bytes,
            },
        )
    }
}

#[cfg(feature = "memory_profiling")]
fn snapshot() -> MemoryStats {
    let stats = dhat::HeapStats::get();
    MemoryStats {
        bytes_allocated: stats.total_bytes,
        allocation_count: stats.total_blocks,
        peak_bytes: stats.max_bytes as u64,
    }
}

#[cfg(not(feature = "memory_profiling"))]
fn snapshot() -> MemoryStats {
    MemoryStats::default()
}
