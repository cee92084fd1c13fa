//! Archetype-based component storage.
//!
//! Entities that own exactly the same set of component types share an archetype, and every
//! component type of that archetype is stored in its own dense column:
//!
//! ```text
//! Archetype {Position, Velocity}
//! ┌──────────────────────────────────────────────────────┐
//! │ Entities: [E1,          E4,          E7          ]   │
//! │ Position: [Pos{x:1,y:2}, Pos{x:3,y:4}, Pos{x:5,y:6}] │
//! │ Velocity: [Vel{..},      Vel{..},      Vel{..}     ] │
//! └──────────────────────────────────────────────────────┘
//!              row 0         row 1         row 2
//! ```
//!
//! Iterating everything with a component combination therefore only touches contiguous,
//! homogeneous memory.
//!
//! # Structural changes
//!
//! [`Storage`] is the only component that moves entity data around. It keeps the location table
//! (entity → archetype and row) in step with the archetypes:
//!
//! - **build**: an entity's first appearance, appended to the archetype of its signature
//! - **add / remove component**: migrate the entity's row to the archetype of the new signature
//! - **destroy**: remove the row and hand the entity id back to the allocator
//!
//! Rows are removed with swap-remove, which moves the last row of the archetype into the hole.
//! Every removal repairs the location of that moved entity before returning.
//!
//! Each operation validates everything it can fail on (unknown entity, unregistered component,
//! wrong value type) before touching any data, so a failed call leaves the storage unchanged.
//!
//! ```rust,ignore
//! let mut storage = Storage::new();
//!
//! let entity = storage.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 1.0 }))?;
//! storage.remove_component::<Velocity>(entity)?;
//! storage.add_component(entity, Health(10))?;
//!
//! let query = storage.components().signature::<Position>();
//! for id in storage.find_matching(&query) {
//!     let archetype = storage.archetype(id).unwrap();
//!     // ...
//! }
//! ```

use std::{any::Any, sync::Arc};

use log::trace;

mod builder;
mod column;
mod location;
mod row;

pub use builder::Builder;
pub use column::{Column, TypedColumn};
pub use location::Location;
pub use row::Row;

use crate::ecs::{
    archetype::{self, Archetype},
    component::{self, BoxedValue, Bundle, Component, Signature, Values},
    entity::{self, Entity, IdAllocator},
    error::{Error, Result},
};

/// Rows reserved in every column of a newly created archetype unless configured otherwise.
pub const DEFAULT_COLUMN_CAPACITY: usize = 16;

/// Storage configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Rows reserved in every column of a newly created archetype.
    pub column_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            column_capacity: DEFAULT_COLUMN_CAPACITY,
        }
    }
}

/// The central authority for entity data: archetypes, entity locations, and the entity id
/// allocator, driven by a component registry that may be shared with other storages.
pub struct Storage<A: IdAllocator = entity::Allocator> {
    /// Component types known to this storage.
    components: Arc<component::Registry>,

    /// Every archetype, indexed by id and by signature.
    archetypes: archetype::Registry,

    /// Where each live entity is stored.
    locations: entity::Locations,

    /// Hands out and recycles entity ids.
    allocator: A,
}

impl Storage {
    /// Create an empty storage with its own component registry and allocator.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty storage using `config`.
    #[inline]
    pub fn with_config(config: Config) -> Self {
        Self::with_parts(
            Arc::new(component::Registry::new()),
            entity::Allocator::new(),
            config,
        )
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: IdAllocator> Storage<A> {
    /// Create an empty storage from a shared component registry and an entity allocator.
    pub fn with_parts(components: Arc<component::Registry>, allocator: A, config: Config) -> Self {
        Self {
            components,
            archetypes: archetype::Registry::with_column_capacity(config.column_capacity),
            locations: entity::Locations::new(),
            allocator,
        }
    }

    /// Register component type `C`, returning its id.
    #[inline]
    pub fn register<C: Component>(&self) -> component::Id {
        self.components.register::<C>()
    }

    /// The component registry.
    #[inline]
    pub fn components(&self) -> &Arc<component::Registry> {
        &self.components
    }

    /// The entity id allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// All archetypes.
    #[inline]
    pub fn archetypes(&self) -> &archetype::Registry {
        &self.archetypes
    }

    /// Get an archetype by id.
    #[inline]
    pub fn archetype(&self, id: archetype::Id) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    /// The number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Determine if no entities are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Where `entity` is stored, or `None` if it is not stored here.
    #[inline]
    pub fn get_location(&self, entity: Entity) -> Option<Location> {
        self.locations.get(entity)
    }

    /// Determine if `entity` is stored here.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.locations.contains(entity)
    }

    /// Allocate a new entity holding the components of `bundle`.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Result<Entity> {
        let values = Values::from_bundle(bundle, &self.components);
        self.spawn_values(values)
    }

    /// Allocate a new entity holding `values`. The id is returned to the allocator on failure.
    pub fn spawn_values(&mut self, values: Values) -> Result<Entity> {
        let entity = self.allocator.alloc();
        match self.build_entity(entity, values) {
            Ok(_) => Ok(entity),
            Err(error) => {
                self.allocator.free(entity);
                Err(error)
            }
        }
    }

    /// Start building a new entity one component at a time.
    #[inline]
    pub fn builder(&mut self) -> Builder<'_, A> {
        Builder::new(self)
    }

    /// Store an already allocated entity with `values`.
    ///
    /// This is the only way an entity enters the storage. Its archetype is the one for the ids of
    /// `values`, created if needed.
    ///
    /// # Errors
    /// - [`Error::EntityExists`] with the stored entity if any generation of `entity`'s id is
    ///   already stored.
    /// - [`Error::UnregisteredComponent`] if an id of `values` is not registered.
    /// - [`Error::TypeMismatch`] if a value is not of its component's type.
    pub fn build_entity(&mut self, entity: Entity, values: Values) -> Result<Location> {
        if let Some(occupant) = self.locations.occupant(entity.id()) {
            return Err(Error::EntityExists(occupant));
        }
        for (id, value) in values.iter() {
            self.check_value(id, value)?;
        }

        let archetype_id = self
            .archetypes
            .get_or_create(&values.signature(), &self.components)?;
        let row = self.archetypes[archetype_id].insert_row(entity, values)?;
        let location = Location::new(archetype_id, row);
        self.locations.set(entity, location);
        trace!("built {entity:?} at {location:?}");
        Ok(location)
    }

    /// Add `value` to `entity`, overwriting the current value if it already has a `C`.
    ///
    /// `C` is registered if needed.
    pub fn add_component<C: Component>(&mut self, entity: Entity, value: C) -> Result<()> {
        let id = self.components.register::<C>();
        self.add_component_by_id(entity, id, Box::new(value))
    }

    /// Add a type-erased value for component `id` to `entity`.
    ///
    /// If the entity already has the component the value is overwritten in place. Otherwise the
    /// entity migrates to the archetype of its signature plus `id`.
    ///
    /// # Errors
    /// - [`Error::UnknownEntity`] if `entity` is not stored.
    /// - [`Error::UnregisteredComponent`] if `id` is not registered.
    /// - [`Error::TypeMismatch`] if `value` is not of the component's type.
    pub fn add_component_by_id(
        &mut self,
        entity: Entity,
        id: component::Id,
        value: BoxedValue,
    ) -> Result<()> {
        let location = self.location_of(entity)?;
        self.check_value(id, &*value)?;

        let source = &mut self.archetypes[location.archetype_id()];
        let Some(value) = source.replace(id, location.row(), value)? else {
            return Ok(());
        };

        let signature = source.signature().with(id);
        let target = self.archetypes.get_or_create(&signature, &self.components)?;
        self.migrate(entity, location, target, |values| {
            values.insert(id, value);
        })
    }

    /// Remove component `C` from `entity`, returning its value.
    ///
    /// Returns `Ok(None)` if the entity does not have a `C`.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> Result<Option<C>> {
        let Some(id) = self.components.get::<C>() else {
            self.location_of(entity)?;
            return Ok(None);
        };
        let removed = self.remove_component_by_id(entity, id)?;
        Ok(removed.and_then(|value| value.downcast::<C>().ok().map(|value| *value)))
    }

    /// Remove component `id` from `entity`, returning its type-erased value.
    ///
    /// The entity migrates to the archetype of its signature minus `id`. Removing the last
    /// component moves it to the empty archetype; the entity stays alive. Returns `Ok(None)`
    /// without moving anything if the entity does not have the component.
    ///
    /// # Errors
    /// - [`Error::UnknownEntity`] if `entity` is not stored.
    pub fn remove_component_by_id(
        &mut self,
        entity: Entity,
        id: component::Id,
    ) -> Result<Option<BoxedValue>> {
        let location = self.location_of(entity)?;
        let source = &self.archetypes[location.archetype_id()];
        if !source.signature().contains(id) {
            return Ok(None);
        }

        let signature = source.signature().without(id);
        let target = self.archetypes.get_or_create(&signature, &self.components)?;
        self.migrate(entity, location, target, |values| values.take(id))
    }

    /// Remove `entity` and all of its components, and return its id to the allocator.
    ///
    /// The archetype it lived in stays alive even if it is now empty.
    ///
    /// # Errors
    /// - [`Error::UnknownEntity`] if `entity` is not stored.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        let location = self.location_of(entity)?;
        let moved = self.archetypes[location.archetype_id()].remove_row(location.row())?;
        if moved.is_some() {
            self.repair(location);
        }
        self.locations.clear(entity);
        self.allocator.free(entity);
        trace!("destroyed {entity:?} from {location:?}");
        Ok(())
    }

    /// The `C` value of `entity`.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        let location = self.locations.get(entity)?;
        let id = self.components.get::<C>()?;
        self.archetypes[location.archetype_id()].get::<C>(id, location.row())
    }

    /// The `C` value of `entity`, mutably.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let location = self.locations.get(entity)?;
        let id = self.components.get::<C>()?;
        self.archetypes[location.archetype_id()].get_mut::<C>(id, location.row())
    }

    /// Determine if `entity` has a `C`.
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        match (self.locations.get(entity), self.components.get::<C>()) {
            (Some(location), Some(id)) => self.archetypes[location.archetype_id()]
                .signature()
                .contains(id),
            _ => false,
        }
    }

    /// All `C` values stored in archetype `id`, in row order.
    pub fn slice<C: Component>(&self, id: archetype::Id) -> Option<&[C]> {
        let component = self.components.get::<C>()?;
        self.archetypes.get(id)?.slice::<C>(component)
    }

    /// All `C` values stored in archetype `id` mutably, in row order.
    ///
    /// Only values can be changed this way; rows cannot be added or removed.
    pub fn slice_mut<C: Component>(&mut self, id: archetype::Id) -> Option<&mut [C]> {
        let component = self.components.get::<C>()?;
        self.archetypes.get_mut(id)?.slice_mut::<C>(component)
    }

    /// The archetypes holding every component of `query` that currently store at least one
    /// entity, in creation order.
    pub fn find_matching(&self, query: &Signature) -> Vec<archetype::Id> {
        self.archetypes
            .find_matching(query)
            .into_iter()
            .filter(|id| !self.archetypes[*id].is_empty())
            .collect()
    }

    /// Look up the location of a stored entity.
    fn location_of(&self, entity: Entity) -> Result<Location> {
        let location = self
            .locations
            .get(entity)
            .ok_or(Error::UnknownEntity(entity))?;
        debug_assert!(
            location.row().index() < self.archetypes[location.archetype_id()].len(),
            "{entity:?} points past the end of archetype {:?}",
            location.archetype_id()
        );
        Ok(location)
    }

    /// Check that `id` is registered and `value` has its type.
    fn check_value(&self, id: component::Id, value: &(dyn Any + Send + Sync)) -> Result<()> {
        let info = self.components.require(id)?;
        if info.accepts(value) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                component: id,
                expected: info.name(),
            })
        }
    }

    /// Move `entity` from `from` to archetype `to`, letting `edit` adjust its values on the way.
    ///
    /// Callers must have validated the move: after `edit` the values must exactly fit `to`.
    fn migrate<R>(
        &mut self,
        entity: Entity,
        from: Location,
        to: archetype::Id,
        edit: impl FnOnce(&mut Values) -> R,
    ) -> Result<R> {
        let (mut values, moved) = self.archetypes[from.archetype_id()].take_row(from.row())?;
        if moved.is_some() {
            self.repair(from);
        }

        let output = edit(&mut values);
        let row = self.archetypes[to].insert_row(entity, values)?;
        let location = Location::new(to, row);
        self.locations.set(entity, location);
        trace!("migrated {entity:?} from {from:?} to {location:?}");
        Ok(output)
    }

    /// Point the entity that swap-remove moved into `vacated` at its new row.
    fn repair(&mut self, vacated: Location) {
        if let Some(moved) = self.archetypes[vacated.archetype_id()].entity(vacated.row()) {
            self.locations.set(moved, vacated);
        }
    }
}
