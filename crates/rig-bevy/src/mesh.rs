//! Geometry synthesis for model geoms.
//!
//! Converts geom type/size records and raw mesh buffers into Bevy meshes.
//! Primitive sizes follow the engine's type-specific `geom_size` layout;
//! axis reordering matches the coordinate convention in [`crate::convert`].

#![allow(clippy::cast_possible_truncation)] // f64 -> f32 is intentional for Bevy meshes
#![allow(clippy::cast_sign_loss)] // index tags are checked before casting

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use rig_model::{ModelIntegrityError, RawModel};

use crate::convert::render_tuple;

/// Create a sphere mesh with radius `size[0]`.
#[must_use]
pub fn sphere_mesh(radius: f64) -> Mesh {
    Sphere::new(radius as f32).mesh().build()
}

/// Create the fallback mesh for unrecognized geom types.
///
/// The legacy default is a sphere at half the first size parameter.
#[must_use]
pub fn default_sphere_mesh(size0: f64) -> Mesh {
    sphere_mesh(size0 * 0.5)
}

/// Create a capsule mesh: radius `size[0]`, cylinder length `size[1] * 2`.
///
/// Bevy's `Capsule3d` is Y-axis aligned, which is the engine's Z axis after
/// coordinate conversion.
#[must_use]
pub fn capsule_mesh(radius: f64, half_length: f64) -> Mesh {
    Capsule3d::new(radius as f32, half_length as f32 * 2.0)
        .mesh()
        .build()
}

/// Create a cylinder mesh: radius `size[0]`, full height `size[1] * 2`.
#[must_use]
pub fn cylinder_mesh(radius: f64, half_length: f64) -> Mesh {
    Cylinder::new(radius as f32, half_length as f32 * 2.0)
        .mesh()
        .build()
}

/// Create a box mesh with the axis-reordered full extents
/// (`size[0] * 2`, `size[2] * 2`, `size[1] * 2`).
#[must_use]
pub fn box_mesh(size: [f64; 3]) -> Mesh {
    Cuboid::new(
        size[0] as f32 * 2.0,
        size[2] as f32 * 2.0,
        size[1] as f32 * 2.0,
    )
    .mesh()
    .build()
}

/// Create a unit sphere for ellipsoids.
///
/// The geometry is shared; callers apply the non-uniform scale
/// (`size[0]`, `size[2]`, `size[1]`) on the node's transform.
#[must_use]
pub fn unit_sphere_mesh() -> Mesh {
    Sphere::new(1.0).mesh().build()
}

/// Create the flat ground-plane mesh.
///
/// Bevy's `Plane3d` already lies flat in Y-up, so no rotation is applied by
/// the scene builder for planes. Zero-sized planes fall back to a large quad.
#[must_use]
pub fn plane_mesh(size: [f64; 3]) -> Mesh {
    let half_x = if size[0] > 0.0 { size[0] as f32 } else { 100.0 };
    let half_y = if size[1] > 0.0 { size[1] as f32 } else { 100.0 };
    Plane3d::new(Vec3::Y, Vec2::new(half_x, half_y))
        .mesh()
        .build()
}

/// Unit-length, unit-radius cylinder for tendon segment instances.
#[must_use]
pub fn unit_cylinder_mesh() -> Mesh {
    Cylinder::new(1.0, 1.0).mesh().build()
}

fn slice_range(adr: i32, count: usize, stride: usize) -> Option<std::ops::Range<usize>> {
    let start = usize::try_from(adr).ok()?.checked_mul(stride)?;
    let len = count.checked_mul(stride)?;
    Some(start..start.checked_add(len)?)
}

/// Build a Bevy mesh from the model's shared mesh buffers.
///
/// Vertex and normal 3-tuples get the in-place axis swap and sign flip
/// (y and z swapped, new z negated); texture coordinates are copied
/// unchanged; the face sub-range becomes the index list. Meshes without a
/// normal sub-range get area-weighted vertex normals accumulated in engine
/// space before conversion.
///
/// # Errors
///
/// Returns [`ModelIntegrityError::MeshRange`] when any sub-range falls
/// outside the shared buffers or a face indexes past the vertex count; this
/// aborts the scene load.
pub fn triangle_mesh(model: &RawModel, mesh_id: usize) -> Result<Mesh, ModelIntegrityError> {
    let range_err = ModelIntegrityError::MeshRange { mesh: mesh_id };
    if mesh_id >= model.nmesh {
        return Err(range_err);
    }

    let vertnum = usize::try_from(model.mesh_vertnum[mesh_id]).map_err(|_| range_err.clone())?;
    let facenum = usize::try_from(model.mesh_facenum[mesh_id]).map_err(|_| range_err.clone())?;

    let vert_range = slice_range(model.mesh_vertadr[mesh_id], vertnum, 3)
        .ok_or_else(|| range_err.clone())?;
    let verts = model
        .mesh_vert
        .get(vert_range)
        .ok_or_else(|| range_err.clone())?;

    let face_range = slice_range(model.mesh_faceadr[mesh_id], facenum, 3)
        .ok_or_else(|| range_err.clone())?;
    let faces = model
        .mesh_face
        .get(face_range)
        .ok_or_else(|| range_err.clone())?;

    let positions: Vec<[f32; 3]> = verts
        .chunks_exact(3)
        .map(|v| render_tuple([v[0], v[1], v[2]]))
        .collect();

    let mut indices = Vec::with_capacity(faces.len());
    for &f in faces {
        let idx = usize::try_from(f).map_err(|_| range_err.clone())?;
        if idx >= vertnum {
            return Err(range_err);
        }
        indices.push(idx as u32);
    }

    let normals: Vec<[f32; 3]> = if model.mesh_normaladr[mesh_id] >= 0 {
        let normal_range = slice_range(model.mesh_normaladr[mesh_id], vertnum, 3)
            .ok_or_else(|| range_err.clone())?;
        model
            .mesh_normal
            .get(normal_range)
            .ok_or(range_err)?
            .chunks_exact(3)
            .map(|n| render_tuple([n[0], n[1], n[2]]))
            .collect()
    } else {
        accumulated_normals(verts, &indices)
    };

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);

    if model.mesh_texcoordadr[mesh_id] >= 0 {
        let uv_range = slice_range(model.mesh_texcoordadr[mesh_id], vertnum, 2)
            .ok_or(ModelIntegrityError::MeshRange { mesh: mesh_id })?;
        let uvs: Vec<[f32; 2]> = model
            .mesh_texcoord
            .get(uv_range)
            .ok_or(ModelIntegrityError::MeshRange { mesh: mesh_id })?
            .chunks_exact(2)
            .map(|uv| [uv[0], uv[1]])
            .collect();
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    }

    mesh.insert_indices(Indices::U32(indices));
    Ok(mesh)
}

/// Average adjacent face normals per vertex, engine space, then convert.
fn accumulated_normals(verts: &[f32], indices: &[u32]) -> Vec<[f32; 3]> {
    let vertex_count = verts.len() / 3;
    let mut engine_normals = vec![nalgebra::Vector3::<f64>::zeros(); vertex_count];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let v = |i: usize| {
            nalgebra::Vector3::new(
                f64::from(verts[3 * i]),
                f64::from(verts[3 * i + 1]),
                f64::from(verts[3 * i + 2]),
            )
        };
        let face_normal = (v(i1) - v(i0)).cross(&(v(i2) - v(i0)));
        for &i in &[i0, i1, i2] {
            engine_normals[i] += face_normal;
        }
    }

    engine_normals
        .iter()
        .map(|n| {
            let len = n.norm();
            if len > 1e-6 {
                let unit = n / len;
                render_tuple([unit.x as f32, unit.y as f32, unit.z as f32])
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::render::mesh::VertexAttributeValues;
    use rig_model::factories;

    fn half_extents(mesh: &Mesh) -> Vec3 {
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("positions missing");
        };
        let mut extent = Vec3::ZERO;
        for p in positions {
            extent = extent.max(Vec3::new(p[0].abs(), p[1].abs(), p[2].abs()));
        }
        extent
    }

    #[test]
    fn sphere_extents_match_radius() {
        let he = half_extents(&sphere_mesh(0.7));
        assert_relative_eq!(he.x, 0.7, epsilon = 1e-3);
        assert_relative_eq!(he.y, 0.7, epsilon = 1e-3);
    }

    #[test]
    fn default_sphere_halves_the_size_parameter() {
        let he = half_extents(&default_sphere_mesh(0.8));
        assert_relative_eq!(he.x, 0.4, epsilon = 1e-3);
    }

    #[test]
    fn box_extents_are_reordered() {
        let he = half_extents(&box_mesh([1.0, 2.0, 3.0]));
        assert_relative_eq!(he.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(he.y, 3.0, epsilon = 1e-6);
        assert_relative_eq!(he.z, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn capsule_spans_cylinder_plus_caps() {
        let he = half_extents(&capsule_mesh(0.25, 0.5));
        // Half height = half cylinder length + cap radius.
        assert_relative_eq!(he.y, 0.5 + 0.25, epsilon = 1e-3);
        assert_relative_eq!(he.x, 0.25, epsilon = 1e-3);
    }

    #[test]
    fn cylinder_height_doubles_size1() {
        let he = half_extents(&cylinder_mesh(0.3, 0.9));
        assert_relative_eq!(he.y, 0.9, epsilon = 1e-3);
        assert_relative_eq!(he.x, 0.3, epsilon = 1e-3);
    }

    #[test]
    fn triangle_mesh_swizzles_vertices() {
        let model = factories::meshed_pair();
        let mesh = triangle_mesh(&model, 0).unwrap();
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("positions missing");
        };
        // Engine vertex (0, 1, 0) becomes render (0, 0, -1).
        assert!(positions.contains(&[0.0, 0.0, -1.0]));
        // Engine vertex (0, 0, 1) becomes render (0, 1, 0).
        assert!(positions.contains(&[0.0, 1.0, 0.0]));
    }

    #[test]
    fn triangle_mesh_synthesizes_missing_normals() {
        let model = factories::meshed_pair();
        let mesh = triangle_mesh(&model, 0).unwrap();
        let Some(VertexAttributeValues::Float32x3(normals)) =
            mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            panic!("normals missing");
        };
        assert_eq!(normals.len(), 4);
        for n in normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn out_of_range_faces_are_fatal() {
        let mut model = factories::meshed_pair();
        model.mesh_face[0] = 17;
        assert!(matches!(
            triangle_mesh(&model, 0),
            Err(ModelIntegrityError::MeshRange { mesh: 0 })
        ));
    }

    #[test]
    fn out_of_range_vertex_slice_is_fatal() {
        let mut model = factories::meshed_pair();
        model.mesh_vertnum[0] = 1000;
        assert!(triangle_mesh(&model, 0).is_err());
    }
}
