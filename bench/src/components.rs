//! Component types shared by the benchmarks, sized like typical game data.

use rusty_macros::Component;

/// 3D position (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rotation as euler angles (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4x4 transformation matrix (64 bytes).
#[derive(Component, Clone, Copy, Debug)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

/// Health of a damageable entity.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Remaining lifetime of a short-lived entity.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Lifetime {
    pub remaining: f32,
    pub total: f32,
}

/// RGBA color (16 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Status effect markers, toggled on and off to force migrations.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Burning;

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Frozen;

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Poisoned;

/// Shared payload for fragmentation tests.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Data {
    pub value: f64,
}

// Marker components for creating many archetypes
macro_rules! define_marker_components {
    ($($name:ident),*) => {
        $(
            #[derive(Component, Clone, Copy, Debug, Default)]
            pub struct $name;
        )*
    };
}

define_marker_components!(
    MarkerA, MarkerB, MarkerC, MarkerD, MarkerE, MarkerF, MarkerG, MarkerH, MarkerI, MarkerJ,
    MarkerK, MarkerL, MarkerM, MarkerN, MarkerO, MarkerP
);

/// Spawn `per_archetype` entities into each of 16 archetypes `{Data, Marker*}`.
pub fn spawn_fragmented(storage: &mut rusty_archetypes::ecs::Storage, per_archetype: usize) {
    macro_rules! spawn_with {
        ($($marker:ident),*) => {
            $(
                for _ in 0..per_archetype {
                    let _ = storage.spawn((Data { value: 1.0 }, $marker));
                }
            )*
        };
    }

    spawn_with!(
        MarkerA, MarkerB, MarkerC, MarkerD, MarkerE, MarkerF, MarkerG, MarkerH, MarkerI, MarkerJ,
        MarkerK, MarkerL, MarkerM, MarkerN, MarkerO, MarkerP
    );
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use rusty_archetypes::ecs::Storage;

    use super::*;

    #[test]
    fn document_component_sizes() {
        assert_eq!(size_of::<Position>(), 12);
        assert_eq!(size_of::<Velocity>(), 12);
        assert_eq!(size_of::<Rotation>(), 12);
        assert_eq!(size_of::<Transform>(), 64);
        assert_eq!(size_of::<Health>(), 8);
        assert_eq!(size_of::<Lifetime>(), 8);
        assert_eq!(size_of::<Color>(), 16);
        assert_eq!(size_of::<Data>(), 8);
        assert_eq!(size_of::<Burning>(), 0);
        assert_eq!(size_of::<MarkerA>(), 0);
    }

    #[test]
    fn fragmented_spawn_fills_sixteen_archetypes() {
        // Given
        let mut storage = Storage::new();

        // When
        spawn_fragmented(&mut storage, 3);

        // Then - plus the empty archetype
        assert_eq!(storage.len(), 48);
        assert_eq!(storage.archetypes().len(), 17);
        let data = storage.components().signature::<Data>();
        assert_eq!(storage.find_matching(&data).len(), 16);
    }
}
