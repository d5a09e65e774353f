//! Tendon wrap-path instancing.
//!
//! Tendons render as pooled instances: one capsule segment per consecutive
//! pair of valid wrap points and one sphere per valid endpoint. Instance
//! counts are recomputed from scratch every frame from the instantaneous
//! per-tendon wrap ranges and saturate at the pool capacity; overflow is
//! dropped silently, never an error.

#![allow(clippy::cast_possible_truncation)] // f64 -> f32 is intentional for Bevy

use bevy::math::{Quat, Vec3};
use rig_model::{RawModel, RawState};

/// Capacity of each instance pool (segments and joints).
pub const TENDON_POOL_CAPACITY: usize = 1023;

/// Wrap points at or below this distance from the origin are dead-point
/// sentinels and emit nothing.
pub const DEAD_POINT_EPSILON: f32 = 0.01;

/// Transform of one capsule segment instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentInstance {
    /// Segment midpoint.
    pub translation: Vec3,
    /// Rotation aligning the unit cylinder's Y axis with the segment.
    pub rotation: Quat,
    /// (width, length, width) scale for the unit cylinder.
    pub scale: Vec3,
}

/// Transform of one sphere joint instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointInstance {
    /// Wrap-point position.
    pub translation: Vec3,
    /// Uniform radius scale for the unit sphere.
    pub scale: Vec3,
}

/// Per-frame instance sets for both pools.
#[derive(Debug, Default, Clone)]
pub struct TendonInstances {
    /// Capsule segments, at most the pool capacity.
    pub segments: Vec<SegmentInstance>,
    /// Sphere joints, at most the pool capacity.
    pub joints: Vec<JointInstance>,
}

/// Derive this frame's instance transforms from the wrap-point state.
///
/// For each tendon, walks consecutive wrap-point pairs in its range: every
/// valid endpoint emits a sphere, and a capsule spans the pair only when
/// both endpoints are valid. Both outputs are truncated at `capacity`.
#[must_use]
pub fn plan_instances(model: &RawModel, state: &RawState, capacity: usize) -> TendonInstances {
    let mut instances = TendonInstances::default();

    for tendon in 0..model.ntendon {
        let Some(&adr) = state.ten_wrapadr.get(tendon) else {
            break;
        };
        let Some(&num) = state.ten_wrapnum.get(tendon) else {
            break;
        };
        if num < 2 {
            continue;
        }
        let width = model.tendon_width[tendon] as f32;

        for first in adr..adr + num - 1 {
            if 3 * (first + 2) > state.wrap_xpos.len() {
                break;
            }
            let p0 = crate::convert::render_pos(&state.wrap_xpos, first);
            let p1 = crate::convert::render_pos(&state.wrap_xpos, first + 1);
            let valid0 = p0.length() > DEAD_POINT_EPSILON;
            let valid1 = p1.length() > DEAD_POINT_EPSILON;

            if valid0 && instances.joints.len() < capacity {
                instances.joints.push(JointInstance {
                    translation: p0,
                    scale: Vec3::splat(width),
                });
            }
            if valid1 && instances.joints.len() < capacity {
                instances.joints.push(JointInstance {
                    translation: p1,
                    scale: Vec3::splat(width),
                });
            }

            if valid0 && valid1 && instances.segments.len() < capacity {
                let delta = p1 - p0;
                let length = delta.length();
                if length > 0.0 {
                    instances.segments.push(SegmentInstance {
                        translation: p0 + delta * 0.5,
                        rotation: Quat::from_rotation_arc(Vec3::Y, delta / length),
                        scale: Vec3::new(width, length, width),
                    });
                }
            }
        }
    }

    instances
}
