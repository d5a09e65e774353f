//! Factory constructors for canonical test models.
//!
//! These produce pre-configured [`RawModel`] instances for inline tests,
//! the integration suites in `rig-bevy`, and the example viewer. They build
//! the same dense arrays a real engine export would.

use crate::model::{GeomKind, RawModel};

/// Incrementally builds the shared null-delimited name blob.
struct NameTable {
    blob: Vec<u8>,
}

impl NameTable {
    fn new() -> Self {
        Self { blob: Vec::new() }
    }

    /// Append a name and return its offset.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn push(&mut self, name: &str) -> i32 {
        let adr = self.blob.len() as i32;
        self.blob.extend_from_slice(name.as_bytes());
        self.blob.push(0);
        adr
    }
}

fn push_geom(
    model: &mut RawModel,
    kind: GeomKind,
    body_id: i32,
    size: [f64; 3],
    pos: [f64; 3],
    rgba: [f32; 4],
) {
    model.ngeom += 1;
    model.geom_type.push(kind as i32);
    model.geom_bodyid.push(body_id);
    model.geom_group.push(0);
    model.geom_matid.push(-1);
    model.geom_dataid.push(-1);
    model.geom_size.extend_from_slice(&size);
    model.geom_pos.extend_from_slice(&pos);
    model.geom_quat.extend_from_slice(&[1.0, 0.0, 0.0, 0.0]);
    model.geom_rgba.extend_from_slice(&rgba);
}

/// A one-body model carrying a single geometry of the given kind.
#[must_use]
pub fn primitive(kind: GeomKind, size: [f64; 3]) -> RawModel {
    let mut names = NameTable::new();
    let mut model = RawModel {
        nbody: 1,
        ..RawModel::default()
    };
    model.name_bodyadr.push(names.push("world"));
    push_geom(&mut model, kind, 0, size, [0.0; 3], [0.5, 0.5, 0.5, 1.0]);
    model.names = names.blob;
    model
}

/// A quadruped: trunk plus four 3-link legs, 12 limited actuators.
///
/// Leg order is FL, FR, RL, RR; actuator order is `3 * leg + joint` with
/// joints hip, thigh, calf, the layout the gait controller writes.
#[must_use]
pub fn quadruped() -> RawModel {
    let mut names = NameTable::new();
    let mut model = RawModel::default();

    let legs = ["FL", "FR", "RL", "RR"];
    let joints = ["hip", "thigh", "calf"];

    // Bodies: world(0), trunk(1), then one body per leg link.
    model.nbody = 2 + legs.len() * joints.len();
    model.name_bodyadr.push(names.push("world"));
    model.name_bodyadr.push(names.push("trunk"));
    for leg in &legs {
        for joint in &joints {
            model.name_bodyadr.push(names.push(&format!("{leg}_{joint}")));
        }
    }

    // Ground plane on the world body, trunk box, one capsule per link.
    push_geom(
        &mut model,
        GeomKind::Plane,
        0,
        [5.0, 5.0, 0.1],
        [0.0; 3],
        [0.3, 0.3, 0.35, 1.0],
    );
    push_geom(
        &mut model,
        GeomKind::Box,
        1,
        [0.19, 0.05, 0.05],
        [0.0; 3],
        [0.8, 0.6, 0.4, 1.0],
    );
    for (leg_idx, _) in legs.iter().enumerate() {
        for (joint_idx, _) in joints.iter().enumerate() {
            let body_id = 2 + leg_idx * joints.len() + joint_idx;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            push_geom(
                &mut model,
                GeomKind::Capsule,
                body_id as i32,
                [0.02, 0.1, 0.0],
                [0.0; 3],
                [0.6, 0.6, 0.6, 1.0],
            );
        }
    }

    // Actuators, one per leg joint, hinge ranges typical of a small quadruped.
    model.nu = legs.len() * joints.len();
    for leg in &legs {
        for joint in &joints {
            model
                .name_actuatoradr
                .push(names.push(&format!("{leg}_{joint}_actuator")));
            model.actuator_ctrlrange.extend_from_slice(&[-2.6, 2.6]);
            model.actuator_ctrllimited.push(1);
        }
    }

    model.names = names.blob;
    model
}

/// A minimal model carrying one tendon with the given wrap-point capacity.
#[must_use]
pub fn tendon_rig(nwrap: usize) -> RawModel {
    let mut names = NameTable::new();
    let mut model = RawModel {
        nbody: 1,
        ntendon: 1,
        nwrap,
        ..RawModel::default()
    };
    model.name_bodyadr.push(names.push("world"));
    push_geom(
        &mut model,
        GeomKind::Sphere,
        0,
        [0.05, 0.0, 0.0],
        [0.0; 3],
        [0.5, 0.5, 0.5, 1.0],
    );
    model.tendon_width.push(0.005);
    model.names = names.blob;
    model
}

/// Two geoms sharing one tetrahedron mesh asset, for cache-identity tests.
#[must_use]
pub fn meshed_pair() -> RawModel {
    let mut names = NameTable::new();
    let mut model = RawModel {
        nbody: 1,
        nmesh: 1,
        ..RawModel::default()
    };
    model.name_bodyadr.push(names.push("world"));

    // Tetrahedron: 4 vertices, 4 faces, no normals or texcoords.
    model.mesh_vertadr.push(0);
    model.mesh_vertnum.push(4);
    model.mesh_normaladr.push(-1);
    model.mesh_texcoordadr.push(-1);
    model.mesh_faceadr.push(0);
    model.mesh_facenum.push(4);
    model.mesh_vert.extend_from_slice(&[
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0,
    ]);
    model
        .mesh_face
        .extend_from_slice(&[0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3]);

    for offset in [-0.5, 0.5] {
        push_geom(
            &mut model,
            GeomKind::Mesh,
            0,
            [1.0, 1.0, 1.0],
            [offset, 0.0, 0.0],
            [0.7, 0.4, 0.4, 1.0],
        );
        let last = model.ngeom - 1;
        model.geom_dataid[last] = 0;
    }

    model.names = names.blob;
    model
}

/// A textured ground plane whose material references texture id 2.
///
/// Textures 0 and 1 are 1x1 placeholders so the ground texture lands on the
/// id the repeat special-case keys on.
#[must_use]
pub fn textured_floor() -> RawModel {
    let mut names = NameTable::new();
    let mut model = RawModel {
        nbody: 1,
        nmat: 1,
        ntex: 3,
        ..RawModel::default()
    };
    model.name_bodyadr.push(names.push("world"));

    push_geom(
        &mut model,
        GeomKind::Plane,
        0,
        [10.0, 10.0, 0.1],
        [0.0; 3],
        [1.0, 1.0, 1.0, 1.0],
    );
    model.geom_matid[0] = 0;

    model.mat_rgba.extend_from_slice(&[1.0, 1.0, 1.0, 1.0]);
    model.mat_texid.push(2);
    model.mat_shininess.push(0.2);
    model.mat_reflectance.push(0.3);
    model.mat_specular.push(0.6);

    // Two 1x1 placeholders, then a 2x2 checker as the ground texture.
    for _ in 0..2 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        model.tex_adr.push(model.tex_rgb.len() as i32);
        model.tex_width.push(1);
        model.tex_height.push(1);
        model.tex_rgb.extend_from_slice(&[128, 128, 128]);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    model.tex_adr.push(model.tex_rgb.len() as i32);
    model.tex_width.push(2);
    model.tex_height.push(2);
    model.tex_rgb.extend_from_slice(&[
        200, 200, 200, 60, 60, 60, //
        60, 60, 60, 200, 200, 200,
    ]);

    model.names = names.blob;
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadruped_actuator_layout_matches_gait_order() {
        let model = quadruped();
        assert_eq!(model.nu, 12);
        assert_eq!(model.actuator_name(0), "FL_hip_actuator");
        assert_eq!(model.actuator_name(5), "FR_calf_actuator");
        assert_eq!(model.actuator_name(11), "RR_calf_actuator");
    }

    #[test]
    fn meshed_pair_geoms_share_one_mesh() {
        let model = meshed_pair();
        assert_eq!(model.geom_dataid, vec![0, 0]);
        assert_eq!(model.mesh_facenum[0], 4);
    }

    #[test]
    fn textured_floor_uses_the_ground_texture_id() {
        let model = textured_floor();
        assert_eq!(model.mat_texid[0], 2);
        let adr = model.tex_adr[2] as usize;
        assert_eq!(model.tex_rgb[adr], 200);
    }
}
