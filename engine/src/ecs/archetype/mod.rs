//! Archetypes: the storage unit for entities sharing one exact set of component types.
//!
//! An [`Archetype`] owns one [`Column`] per component id of its [`Signature`], ordered like the
//! signature, plus the row → entity vector. Row `r` of every column belongs to the entity at
//! `entities[r]`, so the columns and the entity vector always have the same length.
//!
//! Rows are removed with swap-remove. When that relocates the former last row, the relocation is
//! reported back to the caller, which owns the entity → location mapping and must repair it.
//!
//! The [`Registry`] guarantees there is at most one archetype per signature.

use std::fmt;

mod registry;

pub use registry::Registry;

use crate::ecs::{
    component::{self, BoxedValue, Component, Signature, Values},
    entity::Entity,
    error::{Error, Result},
    storage::{Column, Row, TypedColumn},
};

/// A unique identifier for an archetype, dense within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// The archetype holding entities with no components. Every registry creates it first.
    pub const EMPTY: Self = Self(0);

    /// Create a new Id with the given unique identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Id(id)
    }

    /// Get the index of the Id as a usize to be used in collections.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The entities sharing one signature, with their component values stored column-wise.
pub struct Archetype {
    /// The archetype's unique identifier.
    id: Id,

    /// The components that make up this archetype.
    signature: Signature,

    /// One column per signature id, in signature order.
    columns: Vec<Box<dyn Column>>,

    /// The entity owning each row.
    entities: Vec<Entity>,
}

impl Archetype {
    /// Create an archetype from columns built for each id of `signature`, in signature order.
    pub(crate) fn new(id: Id, signature: Signature, columns: Vec<Box<dyn Column>>) -> Self {
        debug_assert_eq!(signature.len(), columns.len());
        debug_assert!(
            signature
                .iter()
                .zip(columns.iter())
                .all(|(id, column)| *id == column.component_id())
        );
        Self {
            id,
            signature,
            columns,
            entities: Vec::new(),
        }
    }

    /// Get the Id of this archetype.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the component signature of this archetype.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Determines whether this archetype holds every component of `query`.
    #[inline]
    pub fn supports(&self, query: &Signature) -> bool {
        self.signature.is_superset_of(query)
    }

    /// The number of rows (entities) stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Determine if no entities are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entity stored at `row`.
    #[inline]
    pub fn entity(&self, row: Row) -> Option<Entity> {
        self.entities.get(row.index()).copied()
    }

    /// The entities stored, in row order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Reserve room for `additional` more rows in every column.
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
        for column in &mut self.columns {
            column.reserve(additional);
        }
    }

    /// Append a row for `entity` holding `values`.
    ///
    /// The ids of `values` must be exactly this archetype's signature and each value must have
    /// its component's type. Both are checked before any column is touched, so a failed insert
    /// leaves the archetype unchanged.
    ///
    /// # Errors
    /// - [`Error::SignatureMismatch`] if the value ids differ from the signature.
    /// - [`Error::TypeMismatch`] if a value does not have its column's type.
    pub fn insert_row(&mut self, entity: Entity, values: Values) -> Result<Row> {
        if !values.ids().eq(self.signature.iter().copied()) {
            return Err(Error::SignatureMismatch {
                expected: self.signature.clone(),
                actual: values.signature(),
            });
        }
        for (column, (_, value)) in self.columns.iter().zip(values.iter()) {
            if !column.accepts(value) {
                return Err(Error::TypeMismatch {
                    component: column.component_id(),
                    expected: column.type_name(),
                });
            }
        }

        let row = Row::new(self.entities.len());
        for (column, (_, value)) in self.columns.iter_mut().zip(values) {
            column.push_boxed(value)?;
        }
        self.entities.push(entity);

        #[cfg(debug_assertions)]
        self.verify_invariants();

        Ok(row)
    }

    /// Remove `row` by swapping the last row into its place, dropping its values.
    ///
    /// Returns the former row of the entity that now lives at `row`, or `None` if `row` was the
    /// last row. The caller must repair that entity's location.
    ///
    /// # Errors
    /// - [`Error::RowOutOfRange`] if `row` is not a stored row.
    pub fn remove_row(&mut self, row: Row) -> Result<Option<Row>> {
        self.check_row(row)?;
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        Ok(self.swap_remove_entity(row))
    }

    /// Like [`Archetype::remove_row`], but returns the removed values instead of dropping them.
    ///
    /// # Errors
    /// - [`Error::RowOutOfRange`] if `row` is not a stored row.
    pub fn take_row(&mut self, row: Row) -> Result<(Values, Option<Row>)> {
        self.check_row(row)?;
        let values: Values = self
            .columns
            .iter_mut()
            .map(|column| (column.component_id(), column.move_out(row).0))
            .collect();
        Ok((values, self.swap_remove_entity(row)))
    }

    /// The type-erased column for component `id`.
    #[inline]
    pub fn column(&self, id: component::Id) -> Option<&dyn Column> {
        let index = self.signature.position(id)?;
        Some(self.columns[index].as_ref())
    }

    /// The type-erased column for component `id`, mutably.
    #[inline]
    pub fn column_mut(&mut self, id: component::Id) -> Option<&mut dyn Column> {
        let index = self.signature.position(id)?;
        Some(self.columns[index].as_mut())
    }

    /// The typed column for component `id`, if present and of type `C`.
    #[inline]
    pub fn column_of<C: Component>(&self, id: component::Id) -> Option<&TypedColumn<C>> {
        self.column(id)?.as_any().downcast_ref()
    }

    /// The typed column for component `id` mutably, if present and of type `C`.
    #[inline]
    pub fn column_of_mut<C: Component>(
        &mut self,
        id: component::Id,
    ) -> Option<&mut TypedColumn<C>> {
        self.column_mut(id)?.as_any_mut().downcast_mut()
    }

    /// All values of component `id`, in row order.
    #[inline]
    pub fn slice<C: Component>(&self, id: component::Id) -> Option<&[C]> {
        Some(self.column_of::<C>(id)?.as_slice())
    }

    /// All values of component `id` mutably, in row order.
    #[inline]
    pub fn slice_mut<C: Component>(&mut self, id: component::Id) -> Option<&mut [C]> {
        Some(self.column_of_mut::<C>(id)?.as_mut_slice())
    }

    /// The value of component `id` at `row`.
    #[inline]
    pub fn get<C: Component>(&self, id: component::Id, row: Row) -> Option<&C> {
        self.column_of::<C>(id)?.get(row)
    }

    /// The value of component `id` at `row`, mutably.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, id: component::Id, row: Row) -> Option<&mut C> {
        self.column_of_mut::<C>(id)?.get_mut(row)
    }

    /// Overwrite the value of component `id` at `row` in place.
    ///
    /// Returns `Ok(None)` without consuming anything if `id` is not part of this archetype; the
    /// value is handed back so the caller can migrate instead.
    pub(crate) fn replace(
        &mut self,
        id: component::Id,
        row: Row,
        value: BoxedValue,
    ) -> Result<Option<BoxedValue>> {
        self.check_row(row)?;
        match self.column_mut(id) {
            Some(column) => column.replace_boxed(row, value).map(|_| None),
            None => Ok(Some(value)),
        }
    }

    #[inline]
    fn check_row(&self, row: Row) -> Result<()> {
        if row.index() < self.entities.len() {
            Ok(())
        } else {
            Err(Error::RowOutOfRange {
                row,
                len: self.entities.len(),
            })
        }
    }

    /// Swap-remove the entity at `row`; the columns must already have been swap-removed.
    fn swap_remove_entity(&mut self, row: Row) -> Option<Row> {
        let last = Row::last_of(self.entities.len());
        self.entities.swap_remove(row.index());

        #[cfg(debug_assertions)]
        self.verify_invariants();

        last.filter(|last| *last != row)
    }

    #[cfg(debug_assertions)]
    fn verify_invariants(&self) {
        for column in &self.columns {
            debug_assert_eq!(
                column.len(),
                self.entities.len(),
                "column `{}` length diverged from archetype {:?}",
                column.type_name(),
                self.id
            );
        }
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .field("len", &self.entities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rusty_macros::Component;

    use super::*;
    use crate::ecs::{component::Registry as Components, entity};

    #[derive(Component, Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Component, Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    fn archetype(components: &Components) -> Archetype {
        let signature = components.signature::<(Position, Velocity)>();
        let columns = signature
            .iter()
            .map(|id| components.new_column(*id, 0).unwrap())
            .collect();
        Archetype::new(Id::new(1), signature, columns)
    }

    fn row_values(components: &Components, n: f32) -> Values {
        Values::from_bundle(
            (Position { x: n, y: n }, Velocity { dx: -n, dy: -n }),
            components,
        )
    }

    fn entity(id: u32) -> Entity {
        Entity::new(entity::Id::from(id))
    }

    #[test]
    fn insert_row_appends() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let pos = components.get::<Position>().unwrap();

        // When
        let first = archetype.insert_row(entity(0), row_values(&components, 1.0));
        let second = archetype.insert_row(entity(1), row_values(&components, 2.0));

        // Then
        assert_eq!(first, Ok(Row::new(0)));
        assert_eq!(second, Ok(Row::new(1)));
        assert_eq!(archetype.len(), 2);
        assert_eq!(archetype.entities(), &[entity(0), entity(1)]);
        assert_eq!(
            archetype.get::<Position>(pos, Row::new(1)),
            Some(&Position { x: 2.0, y: 2.0 })
        );
    }

    #[test]
    fn insert_row_with_wrong_ids_is_rejected() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);

        // When
        let result = archetype.insert_row(
            entity(0),
            Values::from_bundle(Position { x: 0.0, y: 0.0 }, &components),
        );

        // Then
        assert!(matches!(result, Err(Error::SignatureMismatch { .. })));
        assert!(archetype.is_empty());
    }

    #[test]
    fn insert_row_with_wrong_type_leaves_columns_untouched() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let pos = components.get::<Position>().unwrap();
        let vel = components.get::<Velocity>().unwrap();
        let mut values = Values::new();
        values.insert_typed(pos, Position { x: 0.0, y: 0.0 });
        values.insert(vel, Box::new(7_u8));

        // When
        let result = archetype.insert_row(entity(0), values);

        // Then
        assert_eq!(
            result,
            Err(Error::TypeMismatch {
                component: vel,
                expected: std::any::type_name::<Velocity>(),
            })
        );
        assert_eq!(archetype.column(pos).unwrap().len(), 0);
        assert_eq!(archetype.column(vel).unwrap().len(), 0);
    }

    #[test]
    fn remove_row_reports_relocation() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let pos = components.get::<Position>().unwrap();
        for i in 0..3 {
            archetype
                .insert_row(entity(i), row_values(&components, i as f32))
                .unwrap();
        }

        // When
        let moved = archetype.remove_row(Row::new(0)).unwrap();

        // Then - the last entity moved into row 0
        assert_eq!(moved, Some(Row::new(2)));
        assert_eq!(archetype.entity(Row::new(0)), Some(entity(2)));
        assert_eq!(
            archetype.slice::<Position>(pos).unwrap(),
            &[Position { x: 2.0, y: 2.0 }, Position { x: 1.0, y: 1.0 }]
        );

        // When - removing the last row moves nothing
        let moved = archetype.remove_row(Row::new(1)).unwrap();

        // Then
        assert_eq!(moved, None);
        assert_eq!(archetype.entities(), &[entity(2)]);
    }

    #[test]
    fn take_row_returns_values() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let vel = components.get::<Velocity>().unwrap();
        archetype
            .insert_row(entity(0), row_values(&components, 1.0))
            .unwrap();
        archetype
            .insert_row(entity(1), row_values(&components, 2.0))
            .unwrap();

        // When
        let (values, moved) = archetype.take_row(Row::new(0)).unwrap();

        // Then
        assert_eq!(moved, Some(Row::new(1)));
        assert_eq!(values.signature(), *archetype.signature());
        assert_eq!(
            values.get_typed::<Velocity>(vel),
            Some(&Velocity { dx: -1.0, dy: -1.0 })
        );
        assert_eq!(archetype.entities(), &[entity(1)]);
    }

    #[test]
    fn out_of_range_rows_are_errors() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        archetype
            .insert_row(entity(0), row_values(&components, 1.0))
            .unwrap();

        // When
        let removed = archetype.remove_row(Row::new(1));
        let taken = archetype.take_row(Row::new(5));

        // Then
        assert_eq!(
            removed,
            Err(Error::RowOutOfRange {
                row: Row::new(1),
                len: 1
            })
        );
        assert!(matches!(taken, Err(Error::RowOutOfRange { len: 1, .. })));
        assert_eq!(archetype.len(), 1);
    }

    #[test]
    fn rows_stay_aligned_across_mixed_operations() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let pos = components.get::<Position>().unwrap();
        let vel = components.get::<Velocity>().unwrap();

        // When - interleave inserts, removals and takes
        for i in 0..10 {
            archetype
                .insert_row(entity(i), row_values(&components, i as f32))
                .unwrap();
        }
        archetype.remove_row(Row::new(3)).unwrap();
        archetype.take_row(Row::new(0)).unwrap();
        archetype
            .insert_row(entity(10), row_values(&components, 10.0))
            .unwrap();
        archetype.remove_row(Row::new(8)).unwrap();
        archetype.take_row(Row::new(4)).unwrap();

        // Then - every row still pairs the entity with its own values
        assert_eq!(archetype.len(), 7);
        for (row, entity) in archetype.entities().iter().enumerate() {
            let n = entity.index() as f32;
            let row = Row::new(row);
            assert_eq!(
                archetype.get::<Position>(pos, row),
                Some(&Position { x: n, y: n })
            );
            assert_eq!(
                archetype.get::<Velocity>(vel, row),
                Some(&Velocity { dx: -n, dy: -n })
            );
        }
        assert_eq!(archetype.column(pos).unwrap().len(), archetype.len());
        assert_eq!(archetype.column(vel).unwrap().len(), archetype.len());
    }

    #[test]
    fn typed_access_checks_the_component() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let pos = components.get::<Position>().unwrap();
        let vel = components.get::<Velocity>().unwrap();
        archetype
            .insert_row(entity(0), row_values(&components, 1.0))
            .unwrap();

        // When
        archetype.get_mut::<Position>(pos, Row::new(0)).unwrap().x = 5.0;
        archetype.slice_mut::<Velocity>(vel).unwrap()[0].dy = 9.0;

        // Then
        assert_eq!(archetype.get::<Position>(pos, Row::new(0)).unwrap().x, 5.0);
        assert_eq!(archetype.get::<Velocity>(vel, Row::new(0)).unwrap().dy, 9.0);
        assert!(archetype.get::<Velocity>(pos, Row::new(0)).is_none());
        assert!(archetype.column(component::Id::new(99)).is_none());
    }

    #[test]
    fn replace_overwrites_or_hands_back() {
        // Given
        let components = Components::new();
        let mut archetype = archetype(&components);
        let pos = components.get::<Position>().unwrap();
        archetype
            .insert_row(entity(0), row_values(&components, 1.0))
            .unwrap();

        // When
        let replaced = archetype.replace(pos, Row::new(0), Box::new(Position { x: 3.0, y: 3.0 }));
        let missing = archetype.replace(
            component::Id::new(42),
            Row::new(0),
            Box::new(Position { x: 0.0, y: 0.0 }),
        );

        // Then
        assert!(matches!(replaced, Ok(None)));
        assert!(matches!(missing, Ok(Some(_))));
        assert_eq!(
            archetype.get::<Position>(pos, Row::new(0)),
            Some(&Position { x: 3.0, y: 3.0 })
        );
    }
}
