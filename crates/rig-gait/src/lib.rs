//! Phase-driven trot gait controller for a quadruped.
//!
//! The controller is a small finite-state generator with two states:
//! idle (relax every actuator back to the standing pose) and moving (cycle
//! a trot, diagonal leg pairs alternating stance and swing). It consumes
//! only elapsed time, a 2D direction, and a speed scalar, and writes joint
//! targets into a caller-owned actuator command buffer without ever
//! consulting the physics engine's own state.
//!
//! Call order per physics tick: feed inputs via [`GaitController::set_direction`]
//! / [`GaitController::set_speed`], then [`GaitController::update`] *before*
//! the engine integrates the step.
//!
//! The buffer layout is 4 legs x 3 joints: legs FL, FR, RL, RR; joints hip,
//! thigh, calf; index `3 * leg + joint`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use std::f64::consts::PI;

/// Duration of one full gait cycle in seconds.
pub const CYCLE_DURATION: f64 = 0.6;
/// Peak vertical clearance of a swing foot.
pub const STEP_HEIGHT: f64 = 0.1;
/// Horizontal reach of a full step.
pub const STEP_LENGTH: f64 = 0.15;
/// Blend rate for the idle return to the standing pose, per second.
pub const RETURN_RATE: f64 = 5.0;
/// Input components at or below this magnitude read as no command.
pub const IDLE_THRESHOLD: f64 = 0.1;
/// Number of actuators driven (4 legs x 3 joints).
pub const NUM_ACTUATORS: usize = 12;

/// Standing pose targets: hip 0.0, thigh 0.9, calf -1.8 per leg.
pub const DEFAULT_POSE: [f64; NUM_ACTUATORS] = [
    0.0, 0.9, -1.8, // FL
    0.0, 0.9, -1.8, // FR
    0.0, 0.9, -1.8, // RL
    0.0, 0.9, -1.8, // RR
];

// Joint mixing coefficients for the swing contribution.
const HIP_LATERAL_GAIN: f64 = 0.8;
const THIGH_FORWARD_GAIN: f64 = 0.5;
const THIGH_VERTICAL_GAIN: f64 = 0.5;
const CALF_VERTICAL_GAIN: f64 = 0.8;

/// Trot gait generator.
///
/// Owns no physics state beyond its own clock and phase. Inputs are
/// clamped/normalized rather than rejected; there are no error conditions.
#[derive(Debug, Clone)]
pub struct GaitController {
    time: f64,
    phase: f64,
    moving: bool,
    direction: [f64; 2],
    speed: f64,
}

impl Default for GaitController {
    fn default() -> Self {
        Self::new()
    }
}

impl GaitController {
    /// Create a controller at rest: zero clock, idle, no direction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            phase: 0.0,
            moving: false,
            direction: [0.0, 0.0],
            speed: 0.0,
        }
    }

    /// Force the standing pose into `ctrl` and zero the clock and phase.
    pub fn reset(&mut self, ctrl: &mut [f64]) {
        self.time = 0.0;
        self.phase = 0.0;
        for (target, &pose) in ctrl.iter_mut().zip(DEFAULT_POSE.iter()) {
            *target = pose;
        }
    }

    /// Set the commanded travel direction.
    ///
    /// The vector is normalized to unit length (or zero when both components
    /// are zero). The idle/moving flag follows the *raw* components: both at
    /// or below [`IDLE_THRESHOLD`] in magnitude means idle. There is no
    /// hysteresis band, so input oscillating near the threshold flips the
    /// state every tick; that is the contract, not an accident.
    pub fn set_direction(&mut self, x: f64, y: f64) {
        self.moving = x.abs() > IDLE_THRESHOLD || y.abs() > IDLE_THRESHOLD;
        let norm = (x * x + y * y).sqrt();
        self.direction = if norm > 0.0 {
            [x / norm, y / norm]
        } else {
            [0.0, 0.0]
        };
    }

    /// Set the speed scalar, clamped to [0, 1].
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.0, 1.0);
    }

    /// Advance the clock by `dt` and write actuator targets into `ctrl`.
    ///
    /// Idle: each actuator relaxes toward its standing target at
    /// [`RETURN_RATE`], skipping actuators already within 0.01. Moving:
    /// regenerate all twelve targets from the current cycle phase.
    pub fn update(&mut self, dt: f64, ctrl: &mut [f64]) {
        self.time += dt;

        if !self.moving {
            for (target, &pose) in ctrl.iter_mut().zip(DEFAULT_POSE.iter()) {
                let error = pose - *target;
                if error.abs() > 0.01 {
                    *target += error * RETURN_RATE * dt;
                }
            }
            return;
        }

        self.phase = (self.time % CYCLE_DURATION) / CYCLE_DURATION;

        for leg in 0..4 {
            let base = 3 * leg;
            if ctrl.len() < base + 3 {
                break;
            }
            let Some(local) = self.leg_phase(leg) else {
                // Stance: no swing contribution.
                ctrl[base] = DEFAULT_POSE[base];
                ctrl[base + 1] = DEFAULT_POSE[base + 1];
                ctrl[base + 2] = DEFAULT_POSE[base + 2];
                continue;
            };

            // Left legs mirror the lateral input, rear legs the forward input.
            let mut dir_x = self.direction[0];
            let mut dir_y = self.direction[1];
            if leg % 2 == 0 {
                dir_y = -dir_y;
            }
            if leg >= 2 {
                dir_x = -dir_x;
            }

            let progress = local - 0.5;
            let vertical = (local * PI).sin() * STEP_HEIGHT * self.speed;
            let forward = dir_x * progress * STEP_LENGTH * self.speed;
            let lateral = dir_y * progress * STEP_LENGTH * self.speed;

            ctrl[base] = DEFAULT_POSE[base] + lateral * HIP_LATERAL_GAIN;
            ctrl[base + 1] = DEFAULT_POSE[base + 1] + forward * THIGH_FORWARD_GAIN
                - vertical * THIGH_VERTICAL_GAIN;
            ctrl[base + 2] = DEFAULT_POSE[base + 2] + vertical * CALF_VERTICAL_GAIN;
        }
    }

    /// Current cycle phase in [0, 1).
    #[must_use]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Whether the controller is in the moving state.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Normalized travel direction (unit length or zero).
    #[must_use]
    pub fn direction(&self) -> [f64; 2] {
        self.direction
    }

    /// Local swing phase of a leg in [0, 1), or `None` while it is in stance.
    ///
    /// Legs split into the diagonal pairs (FL, RR) and (FR, RL); the first
    /// pair swings during the first half of each cycle.
    #[must_use]
    pub fn leg_phase(&self, leg: usize) -> Option<f64> {
        let first_pair = leg == 0 || leg == 3;
        if self.phase < 0.5 {
            first_pair.then(|| self.phase * 2.0)
        } else {
            (!first_pair).then(|| (self.phase - 0.5) * 2.0)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn standing_ctrl() -> Vec<f64> {
        DEFAULT_POSE.to_vec()
    }

    #[test]
    fn reset_writes_the_standing_pose() {
        let mut gait = GaitController::new();
        let mut ctrl = vec![0.0; NUM_ACTUATORS];
        gait.reset(&mut ctrl);
        assert_eq!(ctrl, DEFAULT_POSE.to_vec());
        assert_relative_eq!(gait.phase(), 0.0);
    }

    #[test]
    fn zero_direction_stays_idle_and_converges() {
        let mut gait = GaitController::new();
        gait.set_direction(0.0, 0.0);
        gait.set_speed(0.5);

        // Perturb every actuator, then relax.
        let mut ctrl: Vec<f64> = DEFAULT_POSE.iter().map(|p| p + 0.5).collect();
        let mut previous_error: Vec<f64> = ctrl
            .iter()
            .zip(DEFAULT_POSE.iter())
            .map(|(c, p)| (c - p).abs())
            .collect();

        for _ in 0..200 {
            gait.update(0.016, &mut ctrl);
            assert!(!gait.is_moving());
            for (i, (c, p)) in ctrl.iter().zip(DEFAULT_POSE.iter()).enumerate() {
                let error = (c - p).abs();
                assert!(
                    error <= previous_error[i] + 1e-12,
                    "actuator {i} diverged: {error} > {}",
                    previous_error[i]
                );
                previous_error[i] = error;
            }
        }
        for (c, p) in ctrl.iter().zip(DEFAULT_POSE.iter()) {
            assert!((c - p).abs() <= 0.01 + 1e-9);
        }
    }

    #[test]
    fn relaxation_skips_actuators_already_at_target() {
        let mut gait = GaitController::new();
        let mut ctrl = standing_ctrl();
        ctrl[0] += 0.005; // within tolerance, must not be touched
        ctrl[1] += 0.5;
        gait.update(0.016, &mut ctrl);
        assert_relative_eq!(ctrl[0], DEFAULT_POSE[0] + 0.005);
        assert!(ctrl[1] < DEFAULT_POSE[1] + 0.5);
    }

    #[test]
    fn threshold_gates_the_moving_flag() {
        let mut gait = GaitController::new();
        gait.set_direction(0.1, 0.1);
        assert!(!gait.is_moving());
        gait.set_direction(0.11, 0.0);
        assert!(gait.is_moving());
        gait.set_direction(0.0, -0.2);
        assert!(gait.is_moving());
    }

    #[test]
    fn direction_is_normalized_or_zero() {
        let mut gait = GaitController::new();
        gait.set_direction(3.0, 4.0);
        let [x, y] = gait.direction();
        assert_relative_eq!(x, 0.6);
        assert_relative_eq!(y, 0.8);
        gait.set_direction(0.0, 0.0);
        assert_eq!(gait.direction(), [0.0, 0.0]);
    }

    #[test]
    fn diagonal_pairs_swap_each_half_cycle() {
        let mut gait = GaitController::new();
        gait.set_direction(1.0, 0.0);
        gait.set_speed(1.0);
        let mut ctrl = standing_ctrl();

        // t = 0: phase 0, stance pair (FR, RL) reports no swing phase and
        // the swinging pair is at local phase 0.
        gait.update(0.0, &mut ctrl);
        assert_relative_eq!(gait.phase(), 0.0);
        assert_relative_eq!(gait.leg_phase(0).unwrap(), 0.0);
        assert!(gait.leg_phase(1).is_none());
        assert!(gait.leg_phase(2).is_none());
        assert_relative_eq!(gait.leg_phase(3).unwrap(), 0.0);

        // t = 0.3: half cycle, the pairs have swapped.
        for _ in 0..3 {
            gait.update(0.1, &mut ctrl);
        }
        assert!(gait.leg_phase(0).is_none());
        assert!(gait.leg_phase(1).is_some());
        assert!(gait.leg_phase(2).is_some());
        assert!(gait.leg_phase(3).is_none());

        // t = 0.6: one full cycle, phase wraps to 0.
        for _ in 0..3 {
            gait.update(0.1, &mut ctrl);
        }
        assert_relative_eq!(gait.phase(), 0.0, epsilon = 1e-9);
        assert!(gait.leg_phase(0).is_some());
    }

    #[test]
    fn stance_legs_hold_the_standing_pose() {
        let mut gait = GaitController::new();
        gait.set_direction(1.0, 0.0);
        gait.set_speed(1.0);
        let mut ctrl = standing_ctrl();
        gait.update(0.15, &mut ctrl); // quarter cycle, (FL, RR) swinging

        for leg in [1usize, 2] {
            for joint in 0..3 {
                assert_relative_eq!(ctrl[3 * leg + joint], DEFAULT_POSE[3 * leg + joint]);
            }
        }
        // Swing legs are lifted: calf offset is positive at mid-swing.
        assert!(ctrl[2] > DEFAULT_POSE[2]);
        assert!(ctrl[11] > DEFAULT_POSE[11]);
    }

    #[test]
    fn swing_offsets_follow_the_mixing_contract() {
        let mut gait = GaitController::new();
        gait.set_direction(1.0, 0.0);
        gait.set_speed(1.0);
        let mut ctrl = standing_ctrl();
        // Quarter cycle: FL local phase 0.5, vertical peak, zero progress.
        gait.update(0.15, &mut ctrl);

        let vertical = STEP_HEIGHT;
        assert_relative_eq!(ctrl[0], DEFAULT_POSE[0], epsilon = 1e-9);
        assert_relative_eq!(
            ctrl[1],
            DEFAULT_POSE[1] - vertical * 0.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(ctrl[2], DEFAULT_POSE[2] + vertical * 0.8, epsilon = 1e-9);
    }

    #[test]
    fn rear_legs_invert_the_forward_component() {
        let mut gait = GaitController::new();
        gait.set_direction(1.0, 0.0);
        gait.set_speed(1.0);
        let mut ctrl = standing_ctrl();
        // One eighth cycle: FL and RR swing at local phase 0.25, progress -0.25.
        gait.update(0.075, &mut ctrl);

        let fl_forward = ctrl[1] - DEFAULT_POSE[1];
        let rr_forward = ctrl[10] - DEFAULT_POSE[10];
        // Same vertical term on both; the forward term flips sign for RR.
        let vertical = (0.25f64 * PI).sin() * STEP_HEIGHT;
        let fl_net = fl_forward + vertical * 0.5;
        let rr_net = rr_forward + vertical * 0.5;
        assert_relative_eq!(fl_net, -rr_net, epsilon = 1e-9);
        assert!(fl_net.abs() > 1e-6);
    }

    #[test]
    fn speed_scales_the_swing_amplitude() {
        let mut full = GaitController::new();
        full.set_direction(1.0, 0.0);
        full.set_speed(1.0);
        let mut half = full.clone();
        half.set_speed(0.5);

        let mut ctrl_full = standing_ctrl();
        let mut ctrl_half = standing_ctrl();
        full.update(0.15, &mut ctrl_full);
        half.update(0.15, &mut ctrl_half);

        let full_lift = ctrl_full[2] - DEFAULT_POSE[2];
        let half_lift = ctrl_half[2] - DEFAULT_POSE[2];
        assert_relative_eq!(half_lift * 2.0, full_lift, epsilon = 1e-9);
    }
}
