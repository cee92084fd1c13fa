use std::{
    any::TypeId,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicU32, Ordering},
    },
};

use dashmap::DashMap;
use log::debug;

use crate::ecs::{
    component::{ColumnFactory, Component, Id, Info, IntoSignature, Signature},
    error::{Error, Result},
    storage::Column,
};

/// A thread-safe component registry. This hands out component ids and keeps, for every id, the
/// factory that builds empty columns for that component type.
///
/// The registry uses lock-free reads for TypeId→Id lookups via `DashMap`, making the common read
/// path cheap. Registration only takes a single shard of the map plus a write lock on the info
/// vector, and happens once per type.
///
/// Ids are assigned from a counter owned by the registry value, not from per-type statics, so two
/// registries hand out ids independently and the order is deterministic for a given sequence of
/// registrations. Share one registry between storages (e.g. behind an `Arc`) when they must agree
/// on ids.
pub struct Registry {
    /// Map from TypeId to component Id. Lock-free reads via sharded concurrent hashmap.
    type_map: DashMap<TypeId, Id>,

    /// Registered component info, indexed by id. Protected by RwLock for rare writes.
    components: RwLock<Vec<Option<Info>>>,

    /// Next available component identifier.
    next_id: AtomicU32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new component registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            components: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Register a component type and get its unique identifier.
    ///
    /// Idempotent: registering a type again returns the id it got the first time. Safe to call
    /// concurrently; racing first registrations of the same type still agree on one id.
    pub fn register<C: Component>(&self) -> Id {
        let type_id = TypeId::of::<C>();

        // Fast path: already registered (lock-free read)
        if let Some(id) = self.type_map.get(&type_id) {
            return *id;
        }

        // Slow path: the entry API keeps two threads that both missed from allocating twice.
        *self
            .type_map
            .entry(type_id)
            .or_insert_with(|| {
                let id = Id::new(self.next_id.fetch_add(1, Ordering::Relaxed));

                let mut components = self
                    .components
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                if id.index() >= components.len() {
                    components.resize(id.index() + 1, None);
                }
                components[id.index()] = Some(Info::new::<C>(id));

                debug!(
                    "registered component {} as id {}",
                    std::any::type_name::<C>(),
                    id.index()
                );
                id
            })
            .value()
    }

    /// Get the component id for type `C`, if registered.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_map
            .get(&TypeId::of::<C>())
            .map(|entry| *entry.value())
    }

    /// Get the component info for an id, if registered.
    #[inline]
    pub fn info(&self, id: Id) -> Option<Info> {
        let components = self
            .components
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        components.get(id.index()).and_then(|info| *info)
    }

    /// Get the component info for type `C`, if registered.
    #[inline]
    pub fn info_of<C: Component>(&self) -> Option<Info> {
        self.info(self.get::<C>()?)
    }

    /// Get the info for an id, failing with [`Error::UnregisteredComponent`] if it is unknown.
    #[inline]
    pub fn require(&self, id: Id) -> Result<Info> {
        self.info(id).ok_or(Error::UnregisteredComponent(id))
    }

    /// Get the column factory for a component id.
    #[inline]
    pub fn column_factory(&self, id: Id) -> Result<ColumnFactory> {
        self.require(id).map(|info| info.factory())
    }

    /// Build an empty column for a component id with room for `capacity` rows.
    #[inline]
    pub fn new_column(&self, id: Id, capacity: usize) -> Result<Box<dyn Column>> {
        Ok((self.column_factory(id)?)(id, capacity))
    }

    /// Build the signature for `S`, registering any of its component types not yet known.
    #[inline]
    pub fn signature<S: IntoSignature>(&self) -> Signature {
        S::into_signature(self)
    }

    /// The number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_map.len()
    }

    /// Determine if no component types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_macros::Component;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn component_registration() {
        // Given
        #[derive(Component, Debug)]
        struct Position();

        #[derive(Component, Debug)]
        struct Velocity();

        let registry = Registry::new();

        // When
        let pos_id = registry.register::<Position>();
        let vel_id = registry.register::<Velocity>();

        // Then - ids are handed out densely, in registration order
        assert_eq!(pos_id, Id::new(0));
        assert_eq!(vel_id, Id::new(1));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            *registry.type_map.get(&TypeId::of::<Velocity>()).unwrap(),
            vel_id
        );

        // Then - Registering the same type again should result in the same id
        assert_eq!(registry.register::<Position>(), pos_id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registries_are_independent() {
        // Given
        #[derive(Component, Debug)]
        struct Position();

        #[derive(Component, Debug)]
        struct Velocity();

        let first = Registry::new();
        let second = Registry::new();

        // When
        first.register::<Position>();
        let in_first = first.register::<Velocity>();
        let in_second = second.register::<Velocity>();

        // Then
        assert_eq!(in_first, Id::new(1));
        assert_eq!(in_second, Id::new(0));
        assert!(second.get::<Position>().is_none());
    }

    #[test]
    fn component_info_retrieval() {
        // Given
        #[derive(Component, Debug)]
        struct Health();

        #[derive(Component, Debug)]
        struct Mana();

        let registry = Registry::new();
        let health_id = registry.register::<Health>();

        // When
        let retrieved = registry.info_of::<Health>().unwrap();

        // Then
        assert_eq!(health_id, retrieved.id());
        assert_eq!(registry.info(health_id).unwrap().id(), health_id);
        assert!(registry.info_of::<Mana>().is_none());
        assert!(registry.get::<Mana>().is_none());
    }

    #[test]
    fn column_factory_for_registered_component() {
        // Given
        #[derive(Component, Debug)]
        struct Health(u32);

        let registry = Registry::new();
        let id = registry.register::<Health>();

        // When
        let factory = registry.column_factory(id).unwrap();
        let column = factory(id, 4);

        // Then
        assert_eq!(column.component_id(), id);
        assert!(column.is_empty());
        assert!(registry.new_column(id, 0).is_ok());
    }

    #[test]
    fn column_factory_for_unregistered_id_fails() {
        // Given
        let registry = Registry::new();

        // When
        let result = registry.column_factory(Id::new(42));

        // Then
        assert!(matches!(
            result,
            Err(Error::UnregisteredComponent(id)) if id == Id::new(42)
        ));
        assert!(registry.new_column(Id::new(42), 1).is_err());
    }

    #[test]
    fn concurrent_registration() {
        // Given
        #[derive(Component, Debug)]
        struct Position();

        #[derive(Component, Debug)]
        struct Velocity();

        #[derive(Component, Debug)]
        struct Health();

        let registry = Arc::new(Registry::new());

        // When - Multiple threads register components concurrently
        let handles: Vec<_> = (0..12)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || match i % 3 {
                    0 => registry.register::<Position>(),
                    1 => registry.register::<Velocity>(),
                    _ => registry.register::<Health>(),
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Then - All threads that registered the same type got the same id
        for kind in 0..3 {
            let ids: Vec<_> = results.iter().skip(kind).step_by(3).collect();
            assert!(ids.iter().all(|id| *id == ids[0]));
        }

        // And the three types have distinct ids, all of which resolve to info
        assert_eq!(registry.len(), 3);
        assert_ne!(results[0], results[1]);
        assert_ne!(results[0], results[2]);
        assert_ne!(results[1], results[2]);
        for id in &results[..3] {
            assert!(registry.info(*id).is_some());
        }
    }
}
