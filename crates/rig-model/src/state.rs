//! `RawState` definition.
//!
//! Per-step outputs of the external engine, plus the caller-owned control
//! buffer the gait controller writes into. The engine overwrites the pose
//! and tendon arrays every step; this crate never mutates them.

use crate::model::RawModel;

/// Dynamic simulation state mirrored from the external engine.
///
/// Layout matches [`RawModel`]: flat arrays, 3- and 4-wide quantities
/// addressed as `3 * id` / `4 * id`, quaternions in (w, x, y, z) order.
#[derive(Debug, Clone, Default)]
pub struct RawState {
    /// World-frame body positions, 3 per body.
    pub xpos: Vec<f64>,
    /// World-frame body orientations, 4 per body (w, x, y, z).
    pub xquat: Vec<f64>,
    /// World-frame light positions, 3 per light.
    pub light_xpos: Vec<f64>,
    /// World-frame light directions, 3 per light.
    pub light_xdir: Vec<f64>,
    /// Start index of each tendon's wrap path in `wrap_xpos`.
    pub ten_wrapadr: Vec<usize>,
    /// Instantaneous wrap-point count of each tendon.
    pub ten_wrapnum: Vec<usize>,
    /// World-frame tendon wrap-point positions, 3 per point.
    pub wrap_xpos: Vec<f64>,
    /// Actuator command buffer, one scalar per actuator.
    pub ctrl: Vec<f64>,
}

impl RawState {
    /// Allocate a zeroed state sized for `model`, with identity orientations.
    #[must_use]
    pub fn new(model: &RawModel) -> Self {
        let mut xquat = vec![0.0; 4 * model.nbody];
        for body in 0..model.nbody {
            xquat[4 * body] = 1.0;
        }
        Self {
            xpos: vec![0.0; 3 * model.nbody],
            xquat,
            light_xpos: vec![0.0; 3 * model.nlight],
            light_xdir: vec![0.0; 3 * model.nlight],
            ten_wrapadr: vec![0; model.ntendon],
            ten_wrapnum: vec![0; model.ntendon],
            wrap_xpos: vec![0.0; 3 * model.nwrap],
            ctrl: vec![0.0; model.nu],
        }
    }

    /// Write a body's world position, engine convention.
    pub fn set_body_pos(&mut self, body_id: usize, pos: [f64; 3]) {
        self.xpos[3 * body_id..3 * body_id + 3].copy_from_slice(&pos);
    }

    /// Write a body's world orientation as (w, x, y, z).
    pub fn set_body_quat(&mut self, body_id: usize, quat: [f64; 4]) {
        self.xquat[4 * body_id..4 * body_id + 4].copy_from_slice(&quat);
    }

    /// Write a wrap point's world position, engine convention.
    pub fn set_wrap_pos(&mut self, wrap_id: usize, pos: [f64; 3]) {
        self.wrap_xpos[3 * wrap_id..3 * wrap_id + 3].copy_from_slice(&pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories;
    use crate::model::GeomKind;

    #[test]
    fn new_state_is_sized_for_the_model() {
        let model = factories::quadruped();
        let state = model.make_state();
        assert_eq!(state.xpos.len(), 3 * model.nbody);
        assert_eq!(state.xquat.len(), 4 * model.nbody);
        assert_eq!(state.ctrl.len(), model.nu);
        assert_eq!(state.ten_wrapnum.len(), model.ntendon);
    }

    #[test]
    fn new_state_has_identity_orientations() {
        let model = factories::primitive(GeomKind::Box, [0.1, 0.2, 0.3]);
        let state = model.make_state();
        assert_eq!(&state.xquat[..4], &[1.0, 0.0, 0.0, 0.0]);
    }
}
