use std::{
    collections::HashMap,
    ops::{Index, IndexMut},
    sync::{PoisonError, RwLock},
};

use fixedbitset::FixedBitSet;
use log::debug;

use crate::ecs::{
    archetype::{Archetype, Id},
    component::{self, Signature},
    error::Result,
    storage::{Column, DEFAULT_COLUMN_CAPACITY},
};

/// Central registry of archetypes.
///
/// Archetypes are created on first request and live as long as the registry, so archetype ids
/// stay valid. The empty-signature archetype always exists as [`Id::EMPTY`].
pub struct Registry {
    /// The archetypes stored by their unique identifier
    archetypes: Vec<Archetype>,

    /// The archetypes indexed by their component signatures
    by_signature: HashMap<Signature, Id>,

    /// Matching archetypes per query signature, one bit per archetype index.
    ///
    /// One entry is kept for every distinct query ever asked and entries are never evicted.
    /// Creating an archetype updates every entry, so its cost grows with the number of queries.
    matches: RwLock<HashMap<Signature, FixedBitSet>>,

    /// Rows reserved in every column of a new archetype.
    column_capacity: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding only the empty archetype.
    #[inline]
    pub fn new() -> Self {
        Self::with_column_capacity(DEFAULT_COLUMN_CAPACITY)
    }

    /// Create a registry whose new archetypes reserve `column_capacity` rows per column.
    pub fn with_column_capacity(column_capacity: usize) -> Self {
        let mut registry = Self {
            archetypes: Vec::new(),
            by_signature: HashMap::new(),
            matches: RwLock::new(HashMap::new()),
            column_capacity,
        };
        registry.create(Signature::EMPTY, Vec::new());
        registry
    }

    /// Get the archetype for `signature`, creating it if this is the first request.
    ///
    /// A column factory is resolved for every id before anything is created, so an unknown id
    /// leaves the registry unchanged.
    ///
    /// # Errors
    /// - [`crate::ecs::Error::UnregisteredComponent`] if an id of `signature` is not registered.
    pub fn get_or_create(
        &mut self,
        signature: &Signature,
        components: &component::Registry,
    ) -> Result<Id> {
        if let Some(id) = self.by_signature.get(signature) {
            return Ok(*id);
        }

        let columns = signature
            .iter()
            .map(|id| components.new_column(*id, self.column_capacity))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.create(signature.clone(), columns))
    }

    /// Add a new archetype and fold it into every cached query result.
    fn create(&mut self, signature: Signature, columns: Vec<Box<dyn Column>>) -> Id {
        let id = Id::new(self.archetypes.len() as u32);
        debug!("created archetype {} for {:?}", id.index(), signature.ids());

        let matches = self
            .matches
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (query, bits) in matches.iter_mut() {
            bits.grow(id.index() + 1);
            if signature.is_superset_of(query) {
                bits.insert(id.index());
            }
        }

        self.by_signature.insert(signature.clone(), id);
        self.archetypes.push(Archetype::new(id, signature, columns));
        id
    }

    /// Get the archetype id for exactly `signature`, if it exists.
    #[inline]
    pub fn lookup(&self, signature: &Signature) -> Option<Id> {
        self.by_signature.get(signature).copied()
    }

    /// Get an archetype by its archetype Id.
    #[inline]
    pub fn get(&self, archetype_id: Id) -> Option<&Archetype> {
        self.archetypes.get(archetype_id.index())
    }

    /// Get a mutable archetype by its archetype Id, if it exists.
    #[inline]
    pub fn get_mut(&mut self, archetype_id: Id) -> Option<&mut Archetype> {
        self.archetypes.get_mut(archetype_id.index())
    }

    /// Return the ids of every archetype whose signature is a superset of `query`, in creation
    /// order. Archetypes without rows are included.
    pub fn find_matching(&self, query: &Signature) -> Vec<Id> {
        {
            let matches = self.matches.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(bits) = matches.get(query) {
                return Self::ids(bits);
            }
        }

        let mut bits = FixedBitSet::with_capacity(self.archetypes.len());
        for archetype in self.archetypes.iter().filter(|a| a.supports(query)) {
            bits.insert(archetype.id().index());
        }
        let ids = Self::ids(&bits);
        self.matches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.clone(), bits);
        ids
    }

    #[inline]
    fn ids(bits: &FixedBitSet) -> Vec<Id> {
        bits.ones().map(|index| Id::new(index as u32)).collect()
    }

    /// Iterate all archetypes in creation order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Archetype> {
        self.archetypes.iter()
    }

    /// The number of archetypes, including the empty archetype.
    #[inline]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always `false`: the empty archetype exists from construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Index by archetype id.
///
/// # Panics
/// - If the id was not handed out by this registry.
impl Index<Id> for Registry {
    type Output = Archetype;

    #[inline]
    fn index(&self, archetype_id: Id) -> &Self::Output {
        &self.archetypes[archetype_id.index()]
    }
}

impl IndexMut<Id> for Registry {
    #[inline]
    fn index_mut(&mut self, archetype_id: Id) -> &mut Self::Output {
        &mut self.archetypes[archetype_id.index()]
    }
}

#[cfg(test)]
mod tests {
    use rusty_macros::Component;

    use super::*;
    use crate::ecs::error::Error;

    #[derive(Component)]
    pub struct Comp1 {}
    #[derive(Component)]
    pub struct Comp2 {}
    #[derive(Component)]
    pub struct Comp3 {}

    #[test]
    fn empty_archetype_exists_up_front() {
        // When
        let registry = Registry::new();

        // Then
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(&Signature::EMPTY), Some(Id::EMPTY));
        assert!(registry.get(Id::EMPTY).unwrap().signature().is_empty());
    }

    #[test]
    fn arch_registry_get_or_create_reuse() {
        // Given
        let components = component::Registry::new();
        let mut registry = Registry::new();

        let id1 = components.register::<Comp1>();
        let id2 = components.register::<Comp2>();
        let id3 = components.register::<Comp3>();

        // When
        let arch1 = registry
            .get_or_create(&Signature::new([id1, id2]), &components)
            .unwrap();
        let arch2 = registry
            .get_or_create(&Signature::new([id1, id3]), &components)
            .unwrap();
        let arch3 = registry
            .get_or_create(&Signature::new([id1, id2, id3]), &components)
            .unwrap();

        // Then
        assert_ne!(arch1, arch2);
        assert_ne!(arch1, arch3);
        assert_ne!(arch2, arch3);

        // And When - the same set in another order
        let arch4 = registry
            .get_or_create(&Signature::new([id3, id1]), &components)
            .unwrap();

        // Then
        assert_eq!(arch2, arch4);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn no_duplicate_archetypes_for_permutations() {
        // Given
        let components = component::Registry::new();
        let mut registry = Registry::new();
        let ids = [
            components.register::<Comp1>(),
            components.register::<Comp2>(),
            components.register::<Comp3>(),
        ];
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        // When
        let created: Vec<Id> = orders
            .iter()
            .map(|order| {
                let mut signature = Signature::default();
                for index in order {
                    signature.insert(ids[*index]);
                }
                registry.get_or_create(&signature, &components).unwrap()
            })
            .collect();

        // Then
        assert!(created.iter().all(|id| *id == created[0]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn columns_follow_signature_order() {
        // Given
        let components = component::Registry::new();
        let mut registry = Registry::with_column_capacity(4);
        let id1 = components.register::<Comp1>();
        let id2 = components.register::<Comp2>();

        // When
        let id = registry
            .get_or_create(&Signature::new([id2, id1]), &components)
            .unwrap();

        // Then
        let archetype = registry.get(id).unwrap();
        assert_eq!(archetype.column(id1).unwrap().component_id(), id1);
        assert_eq!(archetype.column(id2).unwrap().component_id(), id2);
        assert!(archetype.column_of::<Comp1>(id1).is_some());
    }

    #[test]
    fn unregistered_component_creates_nothing() {
        // Given
        let components = component::Registry::new();
        let mut registry = Registry::new();
        let id1 = components.register::<Comp1>();
        let unknown = component::Id::new(9);

        // When
        let result = registry.get_or_create(&Signature::new([id1, unknown]), &components);

        // Then
        assert_eq!(result, Err(Error::UnregisteredComponent(unknown)));
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(&Signature::new([id1, unknown])).is_none());
    }

    #[test]
    fn find_matching_returns_supersets() {
        // Given
        let components = component::Registry::new();
        let mut registry = Registry::new();
        let id1 = components.register::<Comp1>();
        let id2 = components.register::<Comp2>();
        let id3 = components.register::<Comp3>();
        let a = registry
            .get_or_create(&Signature::new([id1]), &components)
            .unwrap();
        let ab = registry
            .get_or_create(&Signature::new([id1, id2]), &components)
            .unwrap();
        let bc = registry
            .get_or_create(&Signature::new([id2, id3]), &components)
            .unwrap();

        // When
        let with_1 = registry.find_matching(&Signature::new([id1]));
        let with_2 = registry.find_matching(&Signature::new([id2]));
        let everything = registry.find_matching(&Signature::EMPTY);

        // Then
        assert_eq!(with_1, vec![a, ab]);
        assert_eq!(with_2, vec![ab, bc]);
        assert_eq!(everything, vec![Id::EMPTY, a, ab, bc]);
        assert!(registry.find_matching(&Signature::new([id1, id3])).is_empty());
    }

    #[test]
    fn cached_matches_see_new_archetypes() {
        // Given - a query answered before the matching archetype exists
        let components = component::Registry::new();
        let mut registry = Registry::new();
        let id1 = components.register::<Comp1>();
        let id2 = components.register::<Comp2>();
        let query = Signature::new([id2]);
        assert!(registry.find_matching(&query).is_empty());

        // When
        let a = registry
            .get_or_create(&Signature::new([id1]), &components)
            .unwrap();
        let ab = registry
            .get_or_create(&Signature::new([id1, id2]), &components)
            .unwrap();

        // Then
        assert_ne!(a, ab);
        assert_eq!(registry.find_matching(&query), vec![ab]);
    }
}
