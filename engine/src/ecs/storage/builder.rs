use crate::ecs::{
    component::{self, BoxedValue, Component, Values},
    entity::{Entity, IdAllocator},
    error::Result,
    storage::Storage,
};

/// Collects components for a new entity, then spawns it in one step.
///
/// ```rust,ignore
/// let entity = storage
///     .builder()
///     .with(Position { x: 0.0, y: 0.0 })
///     .with(Velocity { dx: 1.0, dy: 0.0 })
///     .build()?;
/// ```
///
/// Nothing is allocated or stored until [`Builder::build`]; dropping the builder discards the
/// collected values.
#[must_use = "a builder does nothing until `build` is called"]
pub struct Builder<'s, A: IdAllocator> {
    storage: &'s mut Storage<A>,
    values: Values,
}

impl<'s, A: IdAllocator> Builder<'s, A> {
    pub(crate) fn new(storage: &'s mut Storage<A>) -> Self {
        Self {
            storage,
            values: Values::new(),
        }
    }

    /// Add a component, replacing any earlier value of the same type.
    pub fn with<C: Component>(mut self, component: C) -> Self {
        let id = self.storage.register::<C>();
        self.values.insert_typed(id, component);
        self
    }

    /// Add a type-erased value for component `id`. Its type is checked on [`Builder::build`].
    pub fn with_value(mut self, id: component::Id, value: BoxedValue) -> Self {
        self.values.insert(id, value);
        self
    }

    /// Allocate the entity and store it with the collected components.
    pub fn build(self) -> Result<Entity> {
        self.storage.spawn_values(self.values)
    }
}
