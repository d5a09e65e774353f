//! Coordinate conversion between the engine's Z-up frame and Bevy's Y-up frame.
//!
//! This module is THE ONLY place that knows both conventions. Every read
//! from an engine buffer into a renderable transform goes through these
//! functions, and every write back goes through [`engine_pos`].
//!
//! The quaternion mapping encodes a 90-degree axis permutation plus a
//! handedness flip; its component order and signs are exact and must not be
//! "simplified".

#![allow(clippy::cast_possible_truncation)] // f64 -> f32 is intentional for Bevy

use bevy::math::{Quat, Vec3};

/// Read position `index` from a flat engine buffer, swizzled to Y-up.
///
/// Engine (x, y, z) maps to render (x, z, -y).
#[inline]
#[must_use]
pub fn render_pos(buf: &[f64], index: usize) -> Vec3 {
    let i = 3 * index;
    Vec3::new(buf[i] as f32, buf[i + 2] as f32, -buf[i + 1] as f32)
}

/// Read position `index` from a flat buffer without swizzling.
///
/// Used when both ends already share the render convention.
#[inline]
#[must_use]
pub fn render_pos_raw(buf: &[f64], index: usize) -> Vec3 {
    let i = 3 * index;
    Vec3::new(buf[i] as f32, buf[i + 1] as f32, buf[i + 2] as f32)
}

/// Read orientation `index` from a flat engine buffer, swizzled to Y-up.
///
/// The engine stores (w, x, y, z); the render quaternion's (x, y, z, w)
/// components are (-x, -w, z, -y).
#[inline]
#[must_use]
pub fn render_quat(buf: &[f64], index: usize) -> Quat {
    let i = 4 * index;
    Quat::from_xyzw(
        -buf[i + 1] as f32,
        -buf[i] as f32,
        buf[i + 3] as f32,
        -buf[i + 2] as f32,
    )
}

/// Read orientation `index` from a flat (w, x, y, z) buffer without swizzling.
#[inline]
#[must_use]
pub fn render_quat_raw(buf: &[f64], index: usize) -> Quat {
    let i = 4 * index;
    Quat::from_xyzw(
        buf[i + 1] as f32,
        buf[i + 2] as f32,
        buf[i + 3] as f32,
        buf[i] as f32,
    )
}

/// Map a render-space position back to engine axes.
///
/// Render (x, y, z) maps to engine (x, -z, y); exact inverse of
/// [`render_pos`] on positions. Used when pushing an edited render-space
/// position back into the engine (interactive dragging).
#[inline]
#[must_use]
pub fn engine_pos(v: Vec3) -> [f64; 3] {
    [f64::from(v.x), f64::from(-v.z), f64::from(v.y)]
}

/// Swizzle one mesh vertex or normal 3-tuple in place: (x, y, z) -> (x, z, -y).
#[inline]
#[must_use]
pub fn render_tuple(t: [f32; 3]) -> [f32; 3] {
    [t[0], t[2], -t[1]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn position_swizzle_roundtrips() {
        let engine = [1.25, -2.5, 3.75];
        let render = render_pos(&engine, 0);
        let back = engine_pos(render);
        for (a, b) in engine.iter().zip(back.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn position_swizzle_components() {
        let buf = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        let v = render_pos(&buf, 1);
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 3.0);
        assert_relative_eq!(v.z, -2.0);
    }

    #[test]
    fn raw_position_is_identity() {
        let buf = [1.0, 2.0, 3.0];
        assert_eq!(render_pos_raw(&buf, 0), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn quaternion_swizzle_components_are_exact() {
        // Engine (w, x, y, z) = (0.1, 0.2, 0.3, 0.4).
        let buf = [0.1, 0.2, 0.3, 0.4];
        let q = render_quat(&buf, 0);
        assert_relative_eq!(q.x, -0.2);
        assert_relative_eq!(q.y, -0.1);
        assert_relative_eq!(q.z, 0.4);
        assert_relative_eq!(q.w, -0.3);
    }

    #[test]
    fn quaternion_swizzle_preserves_norm() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let buf = [half, 0.0, half, 0.0];
        let q = render_quat(&buf, 0);
        assert_relative_eq!(q.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn raw_quaternion_reorders_only() {
        let buf = [1.0, 0.0, 0.0, 0.0];
        let q = render_quat_raw(&buf, 0);
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn tuple_swizzle_matches_position_swizzle() {
        let t = render_tuple([1.0, 2.0, 3.0]);
        assert_eq!(t, [1.0, 3.0, -2.0]);
    }
}
