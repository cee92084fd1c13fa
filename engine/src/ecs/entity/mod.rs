//! Entity handles, id allocation, and the entity → location table.
//!
//! An [`Entity`] is an opaque handle carrying no data. It pairs an [`Id`], the reusable slot, with
//! a [`Generation`] counting how many times that slot has been handed out. Once an entity is
//! destroyed its id may be reused, but the new entity gets a later generation, so the stale
//! handle no longer matches anything:
//!
//! ```rust,ignore
//! let entity = allocator.alloc(); // Entity { id: 0, generation: 0 }
//! allocator.free(entity);
//! let reused = allocator.alloc(); // Entity { id: 0, generation: 1 }
//! ```
//!
//! The storage engine only needs the [`IdAllocator`] interface to hand out and recycle ids;
//! [`Allocator`] is the default lock-free implementation. [`Locations`] records where each live
//! entity's data is stored.

mod locations;

use std::sync::{
    PoisonError, RwLock,
    atomic::{AtomicU32, AtomicUsize, Ordering},
};

use crossbeam::queue::SegQueue;

pub use locations::Locations;

/// How many times an entity id has been reused. Starts at [`Generation::FIRST`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The generation of a freshly allocated id.
    pub const FIRST: Self = Self(0);

    /// Construct a generation from a raw value.
    #[inline]
    pub const fn new(generation: u32) -> Self {
        Self(generation)
    }

    /// Get the next generation from the current.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// The raw generation value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// The reusable slot part of an entity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct an id from a raw value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this id if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// An entity handle: an id plus the generation it was allocated with.
///
/// Two handles are equal only if both parts match, so a handle kept across a destroy never
/// aliases the entity that later reuses its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The unique identifier of the entity.
    id: Id,

    /// The generation of the entity.
    generation: Generation,
}

impl Entity {
    /// Construct an entity in the first generation of `id`.
    #[inline]
    pub fn new(id: impl Into<Id>) -> Self {
        Self::with_generation(id.into(), Generation::FIRST)
    }

    /// Construct an entity with an explicit generation.
    #[inline]
    pub const fn with_generation(id: Id, generation: Generation) -> Self {
        Self { id, generation }
    }

    /// Get the id of this entity.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the generation of this entity.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Get the index of this entity if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.id.index()
    }

    /// Get a new entity with the same id but the next generation.
    #[inline]
    pub fn genned(&self) -> Self {
        Self::with_generation(self.id, self.generation.next())
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered by id, then generation.
impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.generation.cmp(&other.generation))
    }
}

/// Hands out entity handles and takes them back once destroyed.
///
/// Implementations must never hand out a handle equal to one that is still live. Storage calls
/// [`IdAllocator::free`] exactly once per destroyed entity.
pub trait IdAllocator {
    /// Allocate a handle for a new entity.
    fn alloc(&self) -> Entity;

    /// Return a destroyed entity's id for reuse.
    fn free(&self, entity: Entity);
}

const CHUNK_SIZE: usize = 4096;

/// Growable array of atomic generations, indexed by entity id.
///
/// Chunks are never moved once allocated, so readers only need the read lock.
#[derive(Default, Debug)]
struct Generations {
    chunks: RwLock<Vec<Box<[AtomicU32; CHUNK_SIZE]>>>,
}

impl Generations {
    const fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    fn slot(id: Id) -> (usize, usize) {
        (id.index() / CHUNK_SIZE, id.index() % CHUNK_SIZE)
    }

    fn get(&self, id: Id) -> Generation {
        let (chunk, slot) = Self::slot(id);
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        chunks
            .get(chunk)
            .map(|chunk| Generation(chunk[slot].load(Ordering::Acquire)))
            .unwrap_or(Generation::FIRST)
    }

    fn increment(&self, id: Id) {
        self.ensure_capacity(id);
        let (chunk, slot) = Self::slot(id);
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        chunks[chunk][slot].fetch_add(1, Ordering::Release);
    }

    fn ensure_capacity(&self, id: Id) {
        let (chunk, _) = Self::slot(id);
        let len = self
            .chunks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        if chunk < len {
            return;
        }

        let mut chunks = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        while chunks.len() <= chunk {
            chunks.push(Box::new(std::array::from_fn(|_| AtomicU32::new(0))));
        }
    }
}

/// The default [`IdAllocator`]: lock-free, shareable between threads.
///
/// Fresh ids come from an atomic counter. Freed ids go to a dead pool and are reused before any
/// fresh id; their generation is bumped on free, which invalidates every outstanding handle.
#[derive(Default, Debug)]
pub struct Allocator {
    /// Current generation of each id slot.
    generations: Generations,

    /// Ids available for reuse.
    dead_pool: SegQueue<Id>,

    /// Next fresh id to allocate.
    next_id: AtomicU32,

    /// Entities allocated and not yet freed.
    live: AtomicUsize,
}

impl Allocator {
    /// Construct a new entity allocator starting from id 0.
    #[inline]
    pub const fn new() -> Self {
        Self {
            generations: Generations::new(),
            dead_pool: SegQueue::new(),
            next_id: AtomicU32::new(0),
            live: AtomicUsize::new(0),
        }
    }

    /// The number of entities allocated and not yet freed.
    #[inline]
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Determine if `entity` is the current generation of its id.
    ///
    /// Freed entities never are; an entity whose id was never handed out is reported as current.
    #[inline]
    pub fn is_current(&self, entity: Entity) -> bool {
        self.generations.get(entity.id()) == entity.generation()
    }
}

impl IdAllocator for Allocator {
    fn alloc(&self) -> Entity {
        self.live.fetch_add(1, Ordering::Relaxed);

        if let Some(id) = self.dead_pool.pop() {
            return Entity::with_generation(id, self.generations.get(id));
        }

        let id = Id(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.generations.ensure_capacity(id);
        Entity::new(id)
    }

    fn free(&self, entity: Entity) {
        let id = entity.id();
        self.generations.increment(id);
        self.dead_pool.push(id);
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}
