//! Plugin composition for the scene-synchronization layer.

use bevy::pbr::DirectionalLightShadowMap;
use bevy::prelude::*;
use bevy::transform::TransformSystem;

use crate::resources::{SimModel, SimState, ViewerConfig};
use crate::sync::{
    sync_body_transforms, sync_light_transforms, sync_tendon_instances,
    update_shape_visibility, PoseSyncSet,
};

/// Scene-synchronization plugin.
///
/// Read-only with respect to physics: the external glue owns loading the
/// model, stepping the engine, and writing [`SimState`]. This plugin copies
/// state into the scene hierarchy each frame and applies the viewer
/// configuration.
///
/// # Example
///
/// ```no_run,ignore
/// use bevy::prelude::*;
/// use rig_bevy::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(RigViewerPlugin::default())
///         .run();
/// }
/// ```
pub struct RigViewerPlugin {
    /// Initial viewer configuration.
    pub config: ViewerConfig,
    /// Shadow-map resolution for directional lights.
    pub shadow_map_size: usize,
}

impl Default for RigViewerPlugin {
    fn default() -> Self {
        Self {
            config: ViewerConfig::default(),
            shadow_map_size: 1024,
        }
    }
}

impl RigViewerPlugin {
    /// Create a plugin with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial viewer configuration.
    #[must_use]
    pub fn with_config(mut self, config: ViewerConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for RigViewerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(DirectionalLightShadowMap {
                size: self.shadow_map_size,
            });

        app.configure_sets(
            PostUpdate,
            PoseSyncSet.before(TransformSystem::TransformPropagate),
        );

        app.add_systems(
            PostUpdate,
            (
                (sync_body_transforms, sync_light_transforms)
                    .run_if(resource_exists::<SimState>),
                sync_tendon_instances
                    .run_if(resource_exists::<SimModel>)
                    .run_if(resource_exists::<SimState>),
                update_shape_visibility,
            )
                .in_set(PoseSyncSet),
        );
    }
}
