use std::slice;

use crate::{
    all_tuples,
    ecs::component::{Component, Id, Registry},
};

/// The set of component ids identifying an archetype.
///
/// Ids are kept sorted and de-duplicated, so two signatures built from the same ids in any order
/// compare equal and hash identically. That makes a signature usable directly as a `HashMap` key
/// for archetype lookup.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    ids: Vec<Id>,
}

impl Signature {
    /// The signature with no components.
    pub const EMPTY: Self = Signature { ids: Vec::new() };

    /// Construct a new signature from the given component ids.
    #[inline]
    pub fn new(ids: impl Into<Vec<Id>>) -> Self {
        let mut ids = ids.into();
        ids.sort_unstable();
        ids.dedup();
        ids.shrink_to_fit();
        Self { ids }
    }

    /// The component ids in this signature, in ascending order.
    #[inline]
    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    /// Iterate the component ids in ascending order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Id> {
        self.ids.iter()
    }

    /// Add an id. Returns `false` if it was already present.
    pub fn insert(&mut self, id: Id) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(index) => {
                self.ids.insert(index, id);
                true
            }
        }
    }

    /// Remove an id. Returns `false` if it was not present.
    pub fn remove(&mut self, id: Id) -> bool {
        match self.ids.binary_search(&id) {
            Ok(index) => {
                self.ids.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Determine if this signature contains the given component id.
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// The position of `id` within the sorted ids. Archetypes order their columns the same way,
    /// so this doubles as the column index.
    #[inline]
    pub fn position(&self, id: Id) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// Determine if this signature contains every id of `other`.
    ///
    /// An archetype satisfies a query when its signature is a superset of the query's.
    pub fn is_superset_of(&self, other: &Signature) -> bool {
        if other.ids.len() > self.ids.len() {
            return false;
        }
        // Both sides are sorted, so a single merge pass is enough.
        let mut ours = self.ids.iter();
        'outer: for id in &other.ids {
            for candidate in ours.by_ref() {
                if candidate == id {
                    continue 'outer;
                }
                if candidate > id {
                    return false;
                }
            }
            return false;
        }
        true
    }

    /// Determine if every id of this signature is contained in `other`.
    #[inline]
    pub fn is_subset_of(&self, other: &Signature) -> bool {
        other.is_superset_of(self)
    }

    /// A copy of this signature with `id` added.
    #[inline]
    pub fn with(&self, id: Id) -> Self {
        let mut signature = self.clone();
        signature.insert(id);
        signature
    }

    /// A copy of this signature with `id` removed.
    #[inline]
    pub fn without(&self, id: Id) -> Self {
        let mut signature = self.clone();
        signature.remove(id);
        signature
    }

    /// Create a new signature that is the union with the other signature.
    pub fn union(&self, other: &Signature) -> Self {
        let mut ids = Vec::with_capacity(self.ids.len() + other.ids.len());
        ids.extend_from_slice(&self.ids);
        ids.extend_from_slice(&other.ids);
        Self::new(ids)
    }

    /// Determine if the signature has no ids.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get the number of ids in the signature.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl From<Vec<Id>> for Signature {
    #[inline]
    fn from(value: Vec<Id>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<Id> for Signature {
    fn from_iter<T: IntoIterator<Item = Id>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = &'a Id;
    type IntoIter = slice::Iter<'a, Id>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// A type, or tuple of types, that can be described as a [`Signature`].
///
/// Component types are registered on the fly, so `registry.signature::<(A, B)>()` is a
/// convenient way to build query signatures.
pub trait IntoSignature {
    /// Build the signature, registering any component types not yet known to `registry`.
    fn into_signature(registry: &Registry) -> Signature;
}

impl IntoSignature for () {
    fn into_signature(_registry: &Registry) -> Signature {
        Signature::EMPTY
    }
}

impl<C: Component> IntoSignature for C {
    fn into_signature(registry: &Registry) -> Signature {
        Signature::new(vec![registry.register::<C>()])
    }
}

macro_rules! tuple_signature {
    ($($name: ident),*) => {
        impl<$($name: IntoSignature),*> IntoSignature for ($($name,)*) {
            fn into_signature(registry: &Registry) -> Signature {
                let mut ids = Vec::new();
                $(
                    ids.extend_from_slice(<$name>::into_signature(registry).ids());
                )*
                Signature::new(ids)
            }
        }
    }
}

all_tuples!(tuple_signature);
