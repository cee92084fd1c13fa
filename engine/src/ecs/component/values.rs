use std::{
    any::Any,
    collections::{BTreeMap, btree_map},
    fmt,
};

use crate::{
    all_tuples,
    ecs::component::{Component, Id, Registry, Signature},
};

/// A single type-erased component value.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// The full set of component values for one entity, keyed by component id.
///
/// This is the type-erased currency of the storage engine: entities are built from it, and an
/// entity's row is extracted into it when the entity migrates between archetypes. Values iterate
/// in ascending id order, which is also the column order of an archetype.
#[derive(Default)]
pub struct Values {
    values: BTreeMap<Id, BoxedValue>,
}

impl Values {
    /// Create an empty set of values.
    #[inline]
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Build values from a typed [`Bundle`], registering its component types as needed.
    pub fn from_bundle<B: Bundle>(bundle: B, registry: &Registry) -> Self {
        let mut values = Self::new();
        bundle.write_into(registry, &mut values);
        values
    }

    /// Insert a type-erased value, returning the value it replaced, if any.
    #[inline]
    pub fn insert(&mut self, id: Id, value: BoxedValue) -> Option<BoxedValue> {
        self.values.insert(id, value)
    }

    /// Insert a typed value under `id`, returning the value it replaced, if any.
    #[inline]
    pub fn insert_typed<C: Component>(&mut self, id: Id, value: C) -> Option<BoxedValue> {
        self.insert(id, Box::new(value))
    }

    /// Remove and return the value stored under `id`.
    #[inline]
    pub fn take(&mut self, id: Id) -> Option<BoxedValue> {
        self.values.remove(&id)
    }

    /// Remove the value stored under `id` and downcast it to `C`.
    ///
    /// A value of another type is left in place and `None` is returned.
    pub fn take_typed<C: Component>(&mut self, id: Id) -> Option<C> {
        if !self.get(id)?.is::<C>() {
            return None;
        }
        self.take(id)?.downcast::<C>().ok().map(|value| *value)
    }

    /// Borrow the value stored under `id`.
    #[inline]
    pub fn get(&self, id: Id) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(&id).map(|value| &**value)
    }

    /// Borrow the value stored under `id` as a `C`.
    #[inline]
    pub fn get_typed<C: Component>(&self, id: Id) -> Option<&C> {
        self.get(id)?.downcast_ref::<C>()
    }

    /// Determine if a value is stored under `id`.
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.values.contains_key(&id)
    }

    /// The signature formed by the ids of the stored values.
    pub fn signature(&self) -> Signature {
        // BTreeMap keys are already sorted and unique.
        Signature::new(self.values.keys().copied().collect::<Vec<_>>())
    }

    /// Iterate the ids of the stored values in ascending order.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.values.keys().copied()
    }

    /// Iterate the stored values in ascending id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Id, &(dyn Any + Send + Sync))> + '_ {
        self.values.iter().map(|(id, value)| (*id, &**value))
    }

    /// The number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Determine if no values are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl IntoIterator for Values {
    type Item = (Id, BoxedValue);
    type IntoIter = btree_map::IntoIter<Id, BoxedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl FromIterator<(Id, BoxedValue)> for Values {
    fn from_iter<T: IntoIterator<Item = (Id, BoxedValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// A typed set of component values for one entity: a single component, or a tuple of bundles.
///
/// Writing a bundle registers its component types with the registry, so typed callers never deal
/// with ids directly. When a tuple names the same component type twice the last value wins.
pub trait Bundle: Sized + 'static {
    /// Move every component value of this bundle into `values`.
    fn write_into(self, registry: &Registry, values: &mut Values);
}

impl<C: Component> Bundle for C {
    fn write_into(self, registry: &Registry, values: &mut Values) {
        values.insert_typed(registry.register::<C>(), self);
    }
}

impl Bundle for () {
    fn write_into(self, _registry: &Registry, _values: &mut Values) {
        // No components to write.
    }
}

macro_rules! tuple_bundle {
    ($($name: ident),*) => {
        impl<$($name: Bundle),*> Bundle for ($($name,)*) {
            fn write_into(self, registry: &Registry, values: &mut Values) {
                #[allow(non_snake_case)]
                let ( $($name,)* ) = self;
                $(<$name as Bundle>::write_into($name, registry, values);)*
            }
        }
    }
}

all_tuples!(tuple_bundle);
