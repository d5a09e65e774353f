//! Bevy resources wrapping the engine-facing model and state.
//!
//! The external glue owns stepping; this crate only reads `SimState` (and
//! the gait controller, outside this crate, writes its `ctrl` buffer).

use bevy::prelude::*;
use rig_model::{RawModel, RawState};

/// Resource wrapping the static model. Immutable after loading.
#[derive(Resource)]
pub struct SimModel(pub RawModel);

impl SimModel {
    /// Create a new model resource.
    #[must_use]
    pub fn new(model: RawModel) -> Self {
        Self(model)
    }
}

impl std::ops::Deref for SimModel {
    type Target = RawModel;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Resource wrapping the dynamic state the engine overwrites every step.
#[derive(Resource)]
pub struct SimState(pub RawState);

impl SimState {
    /// Create a new state resource.
    #[must_use]
    pub fn new(state: RawState) -> Self {
        Self(state)
    }
}

impl std::ops::Deref for SimState {
    type Target = RawState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for SimState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Configuration for the viewer.
#[derive(Resource, Debug, Clone)]
pub struct ViewerConfig {
    /// Master toggle for geom visuals.
    pub show_geoms: bool,
    /// Per-group visibility. Groups 3..5 are never built, so only the first
    /// three slots have any effect at runtime.
    pub show_groups: [bool; 6],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            show_geoms: true,
            show_groups: [true; 6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_config_defaults_to_visible() {
        let config = ViewerConfig::default();
        assert!(config.show_geoms);
        assert!(config.show_groups.iter().all(|&g| g));
    }
}
