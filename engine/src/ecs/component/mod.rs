//! Component management for the storage engine.
//!
//! Components are the plain data values attached to entities. This module owns everything that
//! describes component *types*, as opposed to the storage of component *values*:
//!
//! - [`Component`]: The trait that all component types must implement
//! - [`Id`]: A dense identifier handed out once per registered component type
//! - [`Registry`]: Thread-safe registration and lookup of component types
//! - [`Info`]: Metadata about a component type, including its column factory
//! - [`Signature`]: An order-independent set of component ids identifying an archetype
//! - [`Values`] / [`Bundle`]: Type-erased and typed sets of component values for one entity
//!
//! ## Usage
//!
//! ```ignore
//! use rusty_archetypes::ecs::component::{Component, Registry};
//!
//! #[derive(Component)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = Registry::new();
//! let pos_id = registry.register::<Position>();
//! let column = registry.new_column(pos_id, 16)?;
//! ```

use std::{alloc::Layout, any::TypeId, fmt};

mod registry;
mod signature;
mod values;

pub use registry::Registry;
pub use signature::{IntoSignature, Signature};
pub use values::{BoxedValue, Bundle, Values};

use crate::ecs::storage::{Column, TypedColumn};

/// A component identifier. Ids are dense, start at zero, and are never reused by a registry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a new component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// A trait representing a component type.
///
/// At present this only sets the required trait bounds for a type to be stored in a column.
/// Implement it with `#[derive(Component)]`.
pub trait Component: 'static + Sized + Send + Sync {}

/// Builds an empty column for a component id, reserving room for `capacity` rows.
pub type ColumnFactory = fn(Id, usize) -> Box<dyn Column>;

/// Metadata about a registered component type.
#[derive(Clone, Copy)]
pub struct Info {
    id: Id,
    name: &'static str,
    type_id: TypeId,
    layout: Layout,
    factory: ColumnFactory,
}

impl Info {
    /// Describe the component type `C` registered under `id`.
    #[inline]
    pub fn new<C: Component>(id: Id) -> Self {
        Self {
            id,
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
            layout: Layout::new::<C>(),
            factory: new_column::<C>,
        }
    }

    /// The registered component id.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// The Rust type name of the component.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The Rust `TypeId` of the component.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Memory layout of a single component value.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The factory producing empty columns for this component.
    #[inline]
    pub fn factory(&self) -> ColumnFactory {
        self.factory
    }

    /// Build an empty column for this component.
    #[inline]
    pub fn new_column(&self, capacity: usize) -> Box<dyn Column> {
        (self.factory)(self.id, capacity)
    }

    /// Check whether a type-erased value is an instance of this component type.
    #[inline]
    pub fn accepts(&self, value: &(dyn std::any::Any + Send + Sync)) -> bool {
        value.type_id() == self.type_id
    }
}

impl fmt::Debug for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Info")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("layout", &self.layout)
            .finish()
    }
}

/// Column factory stored in every [`Info`]; one instantiation per component type.
fn new_column<C: Component>(id: Id, capacity: usize) -> Box<dyn Column> {
    Box::new(TypedColumn::<C>::with_capacity(id, capacity))
}
