use std::fmt;

use crate::ecs::{
    component::{self, Signature},
    entity::Entity,
    storage::Row,
};

/// Result alias used throughout the storage engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the storage engine.
///
/// Every variant except [`Error::RowOutOfRange`] describes caller misuse and is reported before
/// any data is moved, so the storage is unchanged when one is returned. `RowOutOfRange` means the
/// location table and archetype storage have diverged, which is a bug in the engine itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The component id has no registered column factory.
    UnregisteredComponent(component::Id),

    /// The entity has no location entry (never built, already destroyed, or a stale handle).
    UnknownEntity(Entity),

    /// The entity already has a location, so it cannot be built again.
    EntityExists(Entity),

    /// The component values offered to an archetype do not match its signature.
    SignatureMismatch {
        /// The archetype's signature.
        expected: Signature,
        /// The signature formed by the offered values.
        actual: Signature,
    },

    /// A type-erased value is not of the type registered for the component id.
    TypeMismatch {
        /// The component the value was offered for.
        component: component::Id,
        /// The registered type name for that component.
        expected: &'static str,
    },

    /// A row index past the end of an archetype.
    RowOutOfRange {
        /// The offending row.
        row: Row,
        /// The archetype's row count.
        len: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnregisteredComponent(id) => {
                write!(f, "component {} is not registered", id.index())
            }
            Error::UnknownEntity(entity) => write!(f, "unknown entity: {entity:?}"),
            Error::EntityExists(entity) => write!(f, "entity already exists: {entity:?}"),
            Error::SignatureMismatch { expected, actual } => write!(
                f,
                "signature mismatch: archetype expects {expected:?}, got {actual:?}"
            ),
            Error::TypeMismatch {
                component,
                expected,
            } => write!(
                f,
                "type mismatch for component {}: expected `{expected}`",
                component.index()
            ),
            Error::RowOutOfRange { row, len } => write!(
                f,
                "row {} out of range for archetype with {len} rows",
                row.index()
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_values() {
        // Given
        let unregistered = Error::UnregisteredComponent(component::Id::new(7));
        let out_of_range = Error::RowOutOfRange {
            row: Row::new(4),
            len: 2,
        };

        // Then
        assert_eq!(unregistered.to_string(), "component 7 is not registered");
        assert_eq!(
            out_of_range.to_string(),
            "row 4 out of range for archetype with 2 rows"
        );
    }
}
