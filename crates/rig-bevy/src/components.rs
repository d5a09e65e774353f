//! ECS components linking Bevy entities to model/state indices.

use bevy::prelude::*;
use rig_model::GeomKind;

/// Marker for the root entity of a built simulation scene.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct SimSceneRoot;

/// Links a body entity to its index in the state's pose arrays.
///
/// The pose synchronizer copies `xpos`/`xquat` into this entity's
/// `Transform` every step.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyIndex(pub usize);

impl BodyIndex {
    /// Create a new body index component.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the body index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Links a light entity to its index in the state's light arrays.
///
/// The synthesized default light (when the model has no lights) carries no
/// `LightIndex`, so the synchronizer leaves it alone.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightIndex(pub usize);

/// Visual representation of one geom.
#[derive(Component, Debug, Clone, Copy)]
pub struct GeomVisual {
    /// The shape kind this node was built from.
    pub kind: GeomKind,
    /// Whether the node was built from custom mesh data rather than a
    /// parametric primitive.
    pub from_mesh_data: bool,
}

/// Visibility group of a geom, for runtime group filtering.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisGroup(pub i32);

/// One slot in the tendon segment (capsule) instance pool.
#[derive(Component, Debug, Clone, Copy)]
pub struct TendonSegment(pub usize);

/// One slot in the tendon joint (sphere) instance pool.
#[derive(Component, Debug, Clone, Copy)]
pub struct TendonJoint(pub usize);
