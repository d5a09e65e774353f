//! Example: quadruped trot viewer.
//!
//! Builds the factory quadruped, drives the gait controller from the
//! keyboard, and animates the state with a small kinematic stand-in for the
//! external physics engine (this crate never steps physics itself).
//!
//! Run with: `cargo run -p rig-bevy --example trot_viewer`
//!
//! Controls: WASD to steer, Shift to sprint, Space to reset.

#![allow(clippy::needless_pass_by_value)] // Bevy system parameters

use bevy::prelude::*;
use rig_bevy::prelude::*;
use rig_gait::GaitController;
use rig_model::factories;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(RigViewerPlugin::default())
        .init_resource::<Gait>()
        .add_systems(Startup, setup_scene)
        .add_systems(Update, (read_input, drive_gait, stand_in_engine).chain())
        .run();
}

/// Resource wrapping the gait controller.
#[derive(Resource, Default)]
struct Gait {
    controller: GaitController,
}

/// Build the scene and install the model/state resources.
fn setup_scene(world: &mut World) {
    let model = factories::quadruped();
    let mut state = model.make_state();

    // Standing layout so the first frame is not a pile at the origin.
    state.set_body_pos(1, [0.0, 0.0, 0.3]);
    state.ctrl.copy_from_slice(&rig_gait::DEFAULT_POSE);
    place_legs(&mut state, 0.0, &rig_gait::DEFAULT_POSE);

    match build_scene(world, &model) {
        Ok(scene) => {
            world.insert_resource(scene);
            world.insert_resource(SimModel::new(model));
            world.insert_resource(SimState::new(state));
        }
        Err(e) => {
            eprintln!("Failed to build scene: {e}");
        }
    }

    world.spawn((
        Camera3d::default(),
        Transform::from_xyz(1.2, 0.9, 1.2).looking_at(Vec3::new(0.0, 0.25, 0.0), Vec3::Y),
    ));

    println!("Trot viewer");
    println!("===========");
    println!("  WASD: steer   Shift: sprint   Space: reset pose");
}

/// Map keyboard state onto the controller's direction and speed.
fn read_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut gait: ResMut<Gait>,
    mut state: ResMut<SimState>,
) {
    let mut x = 0.0;
    let mut y = 0.0;
    if keyboard.pressed(KeyCode::KeyW) {
        x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        y -= 1.0;
    }
    gait.controller.set_direction(x, y);
    gait.controller
        .set_speed(if keyboard.pressed(KeyCode::ShiftLeft) {
            1.0
        } else {
            0.6
        });

    if keyboard.just_pressed(KeyCode::Space) {
        let ctrl = &mut state.ctrl;
        gait.controller.reset(ctrl);
    }
}

/// Run the controller before the stand-in engine "integrates".
fn drive_gait(time: Res<Time>, mut gait: ResMut<Gait>, mut state: ResMut<SimState>) {
    let ctrl = &mut state.ctrl;
    gait.controller.update(f64::from(time.delta_secs()), ctrl);
}

/// Kinematic stand-in for the external engine: poses bodies from the
/// control targets so the viewer has something to synchronize.
fn stand_in_engine(model: Res<SimModel>, gait: Res<Gait>, mut state: ResMut<SimState>) {
    let bob = if gait.controller.is_moving() {
        0.01 * (gait.controller.phase() * std::f64::consts::TAU).sin()
    } else {
        0.0
    };
    state.set_body_pos(1, [0.0, 0.0, 0.3 + bob]);

    let ctrl = state.ctrl.clone();
    let mut clamped = ctrl;
    model.clamp_ctrl(&mut clamped);
    place_legs(&mut state, bob, &clamped);
}

/// Tiny forward kinematics: hip anchors at the trunk corners, thigh and
/// calf links hang by their joint angles in the engine's x-z plane.
fn place_legs(state: &mut rig_model::RawState, bob: f64, ctrl: &[f64]) {
    const LINK: f64 = 0.1;
    let corners = [
        (0.15, 0.08),   // FL
        (0.15, -0.08),  // FR
        (-0.15, 0.08),  // RL
        (-0.15, -0.08), // RR
    ];

    for (leg, (cx, cy)) in corners.iter().enumerate() {
        let hip_body = 2 + 3 * leg;
        let thigh = ctrl.get(3 * leg + 1).copied().unwrap_or(0.9);
        let calf = ctrl.get(3 * leg + 2).copied().unwrap_or(-1.8);

        let hip = [*cx, *cy, 0.3 + bob];
        let knee = [
            hip[0] + LINK * thigh.sin(),
            hip[1],
            hip[2] - LINK * thigh.cos(),
        ];
        let shank = thigh + calf;
        let foot = [
            knee[0] + LINK * shank.sin(),
            knee[1],
            knee[2] - LINK * shank.cos(),
        ];

        state.set_body_pos(hip_body, hip);
        state.set_body_pos(hip_body + 1, knee);
        state.set_body_pos(hip_body + 2, foot);
    }
}
