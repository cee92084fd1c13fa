use crate::ecs::{archetype, storage::Row};

/// Where an entity's data lives: the archetype holding it and the row within that archetype.
///
/// The location table is the only authority for this mapping. Every swap-remove that relocates a
/// row must be followed by an update of the relocated entity's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// The archetype id for this entity.
    archetype_id: archetype::Id,

    /// The archetype row the entity is stored at.
    row: Row,
}

impl Location {
    /// Create a new Location with the given archetype and row.
    #[inline]
    pub const fn new(archetype_id: archetype::Id, row: Row) -> Self {
        Self { archetype_id, row }
    }

    /// Get the archetype ID for this location.
    #[inline]
    pub fn archetype_id(&self) -> archetype::Id {
        self.archetype_id
    }

    /// Get the archetype row for this location.
    #[inline]
    pub fn row(&self) -> Row {
        self.row
    }
}
