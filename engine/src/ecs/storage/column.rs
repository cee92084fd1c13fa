use std::any::{Any, type_name};

use crate::ecs::{
    component::{self, BoxedValue, Component},
    error::{Error, Result},
    storage::Row,
};

/// Type-erased, densely packed storage for the values of one component type.
///
/// Archetypes hold their columns as `Box<dyn Column>` so they can mix component types; the engine
/// drives them through this interface (push, swap-remove, move-out) without knowing the concrete
/// type. Callers that do know the type recover the concrete [`TypedColumn`] through
/// [`Column::as_any`] and use its typed accessors.
///
/// Removal always swaps the last value into the removed slot. Whenever that moves a value, the
/// row it came from is reported so the owner can repair whatever points at it.
///
/// Rows past the end are a precondition violation: every method taking a row panics on them.
pub trait Column: Send + Sync {
    /// The component this column stores.
    fn component_id(&self) -> component::Id;

    /// The Rust type name of the stored component.
    fn type_name(&self) -> &'static str;

    /// The number of values stored.
    fn len(&self) -> usize;

    /// Determine if no values are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve room for at least `additional` more values.
    fn reserve(&mut self, additional: usize);

    /// Check whether `value` has this column's component type.
    fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool;

    /// Append a type-erased value, returning the row it was stored at.
    fn push_boxed(&mut self, value: BoxedValue) -> Result<Row>;

    /// Overwrite the value at `row` with a type-erased value, dropping the old one.
    fn replace_boxed(&mut self, row: Row, value: BoxedValue) -> Result<()>;

    /// Remove the value at `row` by swapping the last value into its place.
    ///
    /// Returns the former row of the value that was moved into `row`, or `None` if `row` was the
    /// last row and nothing moved.
    fn swap_remove(&mut self, row: Row) -> Option<Row>;

    /// Like [`Column::swap_remove`], but hands the removed value back instead of dropping it.
    fn move_out(&mut self, row: Row) -> (BoxedValue, Option<Row>);

    /// Access the concrete column for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutably access the concrete column for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The single concrete [`Column`] implementation, one instantiation per component type.
#[derive(Debug)]
pub struct TypedColumn<C: Component> {
    id: component::Id,
    values: Vec<C>,
}

impl<C: Component> TypedColumn<C> {
    /// Create an empty column for component `id`.
    #[inline]
    pub fn new(id: component::Id) -> Self {
        Self::with_capacity(id, 0)
    }

    /// Create an empty column for component `id` with room for `capacity` values.
    #[inline]
    pub fn with_capacity(id: component::Id, capacity: usize) -> Self {
        Self {
            id,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a value, returning the row it was stored at. Amortised O(1).
    #[inline]
    pub fn push(&mut self, value: C) -> Row {
        self.values.push(value);
        Row::new(self.values.len() - 1)
    }

    /// Get the value at `row`, if in range.
    #[inline]
    pub fn get(&self, row: Row) -> Option<&C> {
        self.values.get(row.index())
    }

    /// Get the value at `row` mutably, if in range.
    #[inline]
    pub fn get_mut(&mut self, row: Row) -> Option<&mut C> {
        self.values.get_mut(row.index())
    }

    /// Overwrite the value at `row`, returning the previous value.
    ///
    /// # Panics
    /// - If `row` is out of range.
    #[track_caller]
    pub fn set(&mut self, row: Row, value: C) -> C {
        self.check_row(row);
        std::mem::replace(&mut self.values[row.index()], value)
    }

    /// Remove and return the value at `row` using swap-remove.
    ///
    /// Returns the value and the former row of the value moved into `row`, if any.
    ///
    /// # Panics
    /// - If `row` is out of range.
    #[track_caller]
    pub fn take(&mut self, row: Row) -> (C, Option<Row>) {
        self.check_row(row);
        let last = self.values.len() - 1;
        let value = self.values.swap_remove(row.index());
        let moved = (row.index() != last).then_some(Row::new(last));
        (value, moved)
    }

    /// All values, in row order.
    #[inline]
    pub fn as_slice(&self) -> &[C] {
        &self.values
    }

    /// All values mutably, in row order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.values
    }

    /// Iterate the values in row order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.values.iter()
    }

    /// Downcast a boxed value to `C`, reporting a type mismatch against this column.
    fn downcast(&self, value: BoxedValue) -> Result<C> {
        value
            .downcast::<C>()
            .map(|value| *value)
            .map_err(|_| Error::TypeMismatch {
                component: self.id,
                expected: type_name::<C>(),
            })
    }

    #[inline]
    #[track_caller]
    fn check_row(&self, row: Row) {
        assert!(
            row.index() < self.values.len(),
            "row {} out of range for column `{}` of length {}",
            row.index(),
            type_name::<C>(),
            self.values.len()
        );
    }
}

impl<C: Component> Column for TypedColumn<C> {
    #[inline]
    fn component_id(&self) -> component::Id {
        self.id
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    #[inline]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    #[inline]
    fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        value.is::<C>()
    }

    fn push_boxed(&mut self, value: BoxedValue) -> Result<Row> {
        let value = self.downcast(value)?;
        Ok(self.push(value))
    }

    fn replace_boxed(&mut self, row: Row, value: BoxedValue) -> Result<()> {
        let value = self.downcast(value)?;
        self.set(row, value);
        Ok(())
    }

    fn swap_remove(&mut self, row: Row) -> Option<Row> {
        self.take(row).1
    }

    fn move_out(&mut self, row: Row) -> (BoxedValue, Option<Row>) {
        let (value, moved) = self.take(row);
        (Box::new(value), moved)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
