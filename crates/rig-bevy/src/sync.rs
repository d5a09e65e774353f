//! Pose synchronization systems.
//!
//! Runs once per physics step, after the external engine has integrated:
//! body and light transforms are copied out of the state arrays through the
//! coordinate adapter, and the tendon instance pools are rebuilt from
//! scratch. Running again while the engine is paused is harmless and keeps
//! the hierarchy consistent after manual state edits.

#![allow(clippy::needless_pass_by_value)] // Bevy system parameters

use bevy::prelude::*;

use crate::components::{BodyIndex, GeomVisual, LightIndex, TendonJoint, TendonSegment, VisGroup};
use crate::convert::render_pos;
use crate::resources::{SimModel, SimState, ViewerConfig};
use crate::tendon::{plan_instances, TENDON_POOL_CAPACITY};

/// System set for the per-step scene synchronization.
///
/// Ordered before Bevy's transform propagation so world matrices pick up
/// this step's poses in the same frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoseSyncSet;

/// Copy body poses from the state arrays into body node transforms.
pub fn sync_body_transforms(
    state: Res<SimState>,
    mut bodies: Query<(&BodyIndex, &mut Transform)>,
) {
    for (body, mut transform) in &mut bodies {
        let index = body.0;
        if 3 * index + 3 <= state.xpos.len() && 4 * index + 4 <= state.xquat.len() {
            transform.translation = render_pos(&state.xpos, index);
            transform.rotation = crate::convert::render_quat(&state.xquat, index);
        }
    }
}

/// Copy light positions and re-aim each light along its state direction.
///
/// The direction is read through the same position swizzle as everything
/// else, and the light looks toward `position + direction`.
pub fn sync_light_transforms(
    state: Res<SimState>,
    mut lights: Query<(&LightIndex, &mut Transform)>,
) {
    for (light, mut transform) in &mut lights {
        let index = light.0;
        if 3 * index + 3 > state.light_xpos.len() || 3 * index + 3 > state.light_xdir.len() {
            continue;
        }
        let position = render_pos(&state.light_xpos, index);
        let direction = render_pos(&state.light_xdir, index);
        transform.translation = position;
        if direction.length_squared() > 0.0 {
            transform.look_at(position + direction, Vec3::Y);
        }
    }
}

/// Rebuild the tendon instance pools from this step's wrap points.
///
/// Active instances get their transforms and become visible; slots past the
/// active count are hidden. Counts saturate at the pool capacity.
pub fn sync_tendon_instances(
    model: Res<SimModel>,
    state: Res<SimState>,
    mut segments: Query<
        (&TendonSegment, &mut Transform, &mut Visibility),
        Without<TendonJoint>,
    >,
    mut joints: Query<(&TendonJoint, &mut Transform, &mut Visibility), Without<TendonSegment>>,
) {
    let instances = plan_instances(&model.0, &state.0, TENDON_POOL_CAPACITY);

    for (slot, mut transform, mut visibility) in &mut segments {
        if let Some(segment) = instances.segments.get(slot.0) {
            *transform = Transform {
                translation: segment.translation,
                rotation: segment.rotation,
                scale: segment.scale,
            };
            *visibility = Visibility::Inherited;
        } else {
            *visibility = Visibility::Hidden;
        }
    }

    for (slot, mut transform, mut visibility) in &mut joints {
        if let Some(joint) = instances.joints.get(slot.0) {
            *transform = Transform {
                translation: joint.translation,
                scale: joint.scale,
                ..Transform::default()
            };
            *visibility = Visibility::Inherited;
        } else {
            *visibility = Visibility::Hidden;
        }
    }
}

/// Apply the viewer configuration to geom visibility.
///
/// Only runs when [`ViewerConfig`] changed. Geoms are gated by the master
/// toggle and their visibility group.
pub fn update_shape_visibility(
    config: Res<ViewerConfig>,
    mut shapes: Query<(&mut Visibility, Option<&VisGroup>), With<GeomVisual>>,
) {
    if !config.is_changed() {
        return;
    }

    for (mut visibility, group) in &mut shapes {
        let group_visible = match group {
            Some(g) => {
                let index = usize::try_from(g.0.max(0)).unwrap_or(0).min(5);
                config.show_groups[index]
            }
            None => true,
        };
        *visibility = if config.show_geoms && group_visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}
