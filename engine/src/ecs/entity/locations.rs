use log::warn;

use crate::ecs::{
    entity::{Entity, Generation, Id},
    storage::Location,
};

/// The location table: where each live entity's data is stored.
///
/// Entries are indexed by entity id and tagged with the generation that owns them, so a stale
/// handle whose id has since been reused is not found.
#[derive(Debug, Default, Clone)]
pub struct Locations {
    entries: Vec<Option<(Generation, Location)>>,
    len: usize,
}

impl Locations {
    /// Construct an empty location table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
        }
    }

    /// Record the location of `entity`, returning the location it replaced.
    ///
    /// Any entry held by another generation of the same id is overwritten, so callers adding a
    /// new entity must check [`Locations::occupant`] first.
    pub fn set(&mut self, entity: Entity, location: Location) -> Option<Location> {
        let index = entity.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        let previous = self.entries[index].replace((entity.generation(), location));
        match previous {
            Some((generation, location)) if generation == entity.generation() => Some(location),
            Some(_) => None,
            None => {
                self.len += 1;
                None
            }
        }
    }

    /// Get the location of `entity`, or `None` if it has no entry.
    #[inline]
    pub fn get(&self, entity: Entity) -> Option<Location> {
        match self.entries.get(entity.index()) {
            Some(Some((generation, location))) if *generation == entity.generation() => {
                Some(*location)
            }
            _ => None,
        }
    }

    /// Remove the entry of `entity`. Returns `false` if it had none.
    pub fn clear(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            warn!("attempted to clear the location of an unknown entity: {entity:?}");
            return false;
        }
        self.entries[entity.index()] = None;
        self.len -= 1;
        true
    }

    /// The entity, of any generation, currently holding the entry for `id`.
    #[inline]
    pub fn occupant(&self, id: Id) -> Option<Entity> {
        match self.entries.get(id.index()) {
            Some(Some((generation, _))) => Some(Entity::with_generation(id, *generation)),
            _ => None,
        }
    }

    /// Determine if `entity` has an entry.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// The number of entities with an entry.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Determine if no entity has an entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
