//! `RawModel` definition, integrity checks, and name-table access.
//!
//! [`RawModel`] is the static description of the simulated system as the
//! external engine exposes it: flat typed arrays plus one shared name blob.
//! It is read-only for the lifetime of a scene.

use thiserror::Error;

/// Geometry type tag decoded from `geom_type`.
///
/// The tag values follow the engine's enumeration order. Tags outside the
/// known range decode to `None` and callers fall back to the default sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeomKind {
    /// Infinite ground plane.
    Plane,
    /// Height field terrain (visualization not implemented).
    HeightField,
    /// Sphere defined by radius.
    #[default]
    Sphere,
    /// Capsule (cylinder with hemispherical caps).
    Capsule,
    /// Ellipsoid (rendered as a scaled unit sphere).
    Ellipsoid,
    /// Cylinder.
    Cylinder,
    /// Box.
    Box,
    /// Triangle mesh referencing the shared mesh buffers.
    Mesh,
}

impl GeomKind {
    /// Decode a raw type tag. Returns `None` for unrecognized tags.
    #[must_use]
    pub fn from_raw(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::Plane),
            1 => Some(Self::HeightField),
            2 => Some(Self::Sphere),
            3 => Some(Self::Capsule),
            4 => Some(Self::Ellipsoid),
            5 => Some(Self::Cylinder),
            6 => Some(Self::Box),
            7 => Some(Self::Mesh),
            _ => None,
        }
    }
}

/// Integrity failures in a loaded model.
///
/// These are fatal for the current scene load: the caller keeps the previous
/// scene rather than attaching a partially built one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelIntegrityError {
    /// The shared name blob is absent or empty.
    #[error("model name table is absent or empty")]
    EmptyNameTable,

    /// An index array does not cover its declared count.
    #[error("array `{array}` has length {actual}, expected {expected}")]
    ArrayLength {
        /// Field name of the offending array.
        array: &'static str,
        /// Length implied by the model's counts.
        expected: usize,
        /// Actual length found.
        actual: usize,
    },

    /// A mesh's vertex/normal/face sub-range falls outside the shared buffers.
    #[error("mesh {mesh} addresses out-of-range data in the shared mesh buffers")]
    MeshRange {
        /// Index of the offending mesh.
        mesh: usize,
    },

    /// A texture's pixel sub-range falls outside the shared pixel buffer.
    #[error("texture {texture} addresses out-of-range data in the shared pixel buffer")]
    TextureRange {
        /// Index of the offending texture.
        texture: usize,
    },
}

/// Static model definition mirrored from the external engine.
///
/// All arrays are dense over their counts. 3- and 4-component quantities are
/// stored flat (`3 * id`, `4 * id`). Quaternions are stored in the engine's
/// (w, x, y, z) component order.
#[derive(Debug, Clone, Default)]
pub struct RawModel {
    // ==================== Dimensions ====================
    /// Number of bodies (body 0 is the effective root).
    pub nbody: usize,
    /// Number of geometries.
    pub ngeom: usize,
    /// Number of mesh assets.
    pub nmesh: usize,
    /// Number of materials.
    pub nmat: usize,
    /// Number of textures.
    pub ntex: usize,
    /// Number of lights.
    pub nlight: usize,
    /// Number of tendons.
    pub ntendon: usize,
    /// Total tendon wrap-point capacity across all tendons.
    pub nwrap: usize,
    /// Number of actuators.
    pub nu: usize,

    // ==================== Geoms (indexed by geom_id) ====================
    /// Geometry type tag (see [`GeomKind::from_raw`]).
    pub geom_type: Vec<i32>,
    /// Owning body id.
    pub geom_bodyid: Vec<i32>,
    /// Visibility group (0-5). Groups >= 3 are never built.
    pub geom_group: Vec<i32>,
    /// Material id, or -1 when the geom carries its own color.
    pub geom_matid: Vec<i32>,
    /// Mesh id for mesh geoms, -1 otherwise.
    pub geom_dataid: Vec<i32>,
    /// Type-specific size parameters, 3 per geom.
    pub geom_size: Vec<f64>,
    /// Position in the owning body frame, 3 per geom.
    pub geom_pos: Vec<f64>,
    /// Orientation in the owning body frame, 4 per geom (w, x, y, z).
    pub geom_quat: Vec<f64>,
    /// Per-geom RGBA color, 4 per geom.
    pub geom_rgba: Vec<f32>,

    // ==================== Materials (indexed by mat_id) ====================
    /// Material RGBA color, 4 per material.
    pub mat_rgba: Vec<f32>,
    /// Texture id, or -1 for untextured materials.
    pub mat_texid: Vec<i32>,
    /// Shininess in [0, 1]; roughness derives as `1 - shininess`.
    pub mat_shininess: Vec<f32>,
    /// Reflectance in [0, 1].
    pub mat_reflectance: Vec<f32>,
    /// Specular intensity in [0, 1].
    pub mat_specular: Vec<f32>,

    // ==================== Textures (indexed by tex_id) ====================
    /// Packed RGB pixel data for all textures.
    pub tex_rgb: Vec<u8>,
    /// Byte offset of each texture in `tex_rgb`.
    pub tex_adr: Vec<i32>,
    /// Texture width in pixels.
    pub tex_width: Vec<i32>,
    /// Texture height in pixels.
    pub tex_height: Vec<i32>,

    // ==================== Meshes (indexed by mesh_id) ====================
    /// First vertex index in `mesh_vert` (3-tuples).
    pub mesh_vertadr: Vec<i32>,
    /// Vertex count.
    pub mesh_vertnum: Vec<i32>,
    /// First normal index in `mesh_normal` (3-tuples), -1 when absent.
    pub mesh_normaladr: Vec<i32>,
    /// First texcoord index in `mesh_texcoord` (2-tuples), -1 when absent.
    pub mesh_texcoordadr: Vec<i32>,
    /// First face index in `mesh_face` (3-tuples).
    pub mesh_faceadr: Vec<i32>,
    /// Face count.
    pub mesh_facenum: Vec<i32>,
    /// Shared vertex buffer.
    pub mesh_vert: Vec<f32>,
    /// Shared normal buffer.
    pub mesh_normal: Vec<f32>,
    /// Shared texture-coordinate buffer.
    pub mesh_texcoord: Vec<f32>,
    /// Shared triangle index buffer.
    pub mesh_face: Vec<i32>,

    // ==================== Lights (indexed by light_id) ====================
    /// Nonzero for directional lights, zero for spot lights.
    pub light_directional: Vec<u8>,
    /// Attenuation coefficients [constant, linear, quadratic], 3 per light.
    pub light_attenuation: Vec<f32>,

    // ==================== Actuators (indexed by actuator_id) ====================
    /// Control input limits [min, max], 2 per actuator.
    pub actuator_ctrlrange: Vec<f64>,
    /// Nonzero when `actuator_ctrlrange` is enforced.
    pub actuator_ctrllimited: Vec<u8>,

    // ==================== Tendons (indexed by tendon_id) ====================
    /// Visual tendon width (segment radius).
    pub tendon_width: Vec<f64>,

    // ==================== Names ====================
    /// Null-delimited name blob shared by all entity types.
    pub names: Vec<u8>,
    /// Offset of each body's name in `names`.
    pub name_bodyadr: Vec<i32>,
    /// Offset of each actuator's name in `names`.
    pub name_actuatoradr: Vec<i32>,
}

impl RawModel {
    /// Check the dense-array invariants this crate relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ModelIntegrityError`] when the name blob is empty or an
    /// index array does not cover its declared count. Mesh sub-range bounds
    /// are checked lazily at geometry synthesis time, not here.
    pub fn validate(&self) -> Result<(), ModelIntegrityError> {
        if self.names.is_empty() {
            return Err(ModelIntegrityError::EmptyNameTable);
        }

        let checks: &[(&'static str, usize, usize)] = &[
            ("geom_type", self.geom_type.len(), self.ngeom),
            ("geom_bodyid", self.geom_bodyid.len(), self.ngeom),
            ("geom_group", self.geom_group.len(), self.ngeom),
            ("geom_matid", self.geom_matid.len(), self.ngeom),
            ("geom_dataid", self.geom_dataid.len(), self.ngeom),
            ("geom_size", self.geom_size.len(), 3 * self.ngeom),
            ("geom_pos", self.geom_pos.len(), 3 * self.ngeom),
            ("geom_quat", self.geom_quat.len(), 4 * self.ngeom),
            ("geom_rgba", self.geom_rgba.len(), 4 * self.ngeom),
            ("mat_rgba", self.mat_rgba.len(), 4 * self.nmat),
            ("mat_texid", self.mat_texid.len(), self.nmat),
            ("mat_shininess", self.mat_shininess.len(), self.nmat),
            ("mat_reflectance", self.mat_reflectance.len(), self.nmat),
            ("mat_specular", self.mat_specular.len(), self.nmat),
            ("tex_adr", self.tex_adr.len(), self.ntex),
            ("tex_width", self.tex_width.len(), self.ntex),
            ("tex_height", self.tex_height.len(), self.ntex),
            ("mesh_vertadr", self.mesh_vertadr.len(), self.nmesh),
            ("mesh_vertnum", self.mesh_vertnum.len(), self.nmesh),
            ("mesh_normaladr", self.mesh_normaladr.len(), self.nmesh),
            ("mesh_texcoordadr", self.mesh_texcoordadr.len(), self.nmesh),
            ("mesh_faceadr", self.mesh_faceadr.len(), self.nmesh),
            ("mesh_facenum", self.mesh_facenum.len(), self.nmesh),
            ("light_directional", self.light_directional.len(), self.nlight),
            (
                "light_attenuation",
                self.light_attenuation.len(),
                3 * self.nlight,
            ),
            (
                "actuator_ctrlrange",
                self.actuator_ctrlrange.len(),
                2 * self.nu,
            ),
            (
                "actuator_ctrllimited",
                self.actuator_ctrllimited.len(),
                self.nu,
            ),
            ("tendon_width", self.tendon_width.len(), self.ntendon),
            ("name_bodyadr", self.name_bodyadr.len(), self.nbody),
        ];

        for &(array, actual, expected) in checks {
            if actual != expected {
                return Err(ModelIntegrityError::ArrayLength {
                    array,
                    expected,
                    actual,
                });
            }
        }

        Ok(())
    }

    /// Scan a null-terminated name out of the blob.
    ///
    /// Returns `None` for negative or out-of-range offsets, missing
    /// terminators, invalid UTF-8, or empty names.
    #[must_use]
    pub fn name_at(&self, adr: i32) -> Option<&str> {
        let start = usize::try_from(adr).ok()?;
        if start >= self.names.len() {
            return None;
        }
        let len = self.names[start..].iter().position(|&b| b == 0)?;
        let name = std::str::from_utf8(&self.names[start..start + len]).ok()?;
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Display name for a body, falling back to `Body_<id>`.
    ///
    /// Never fails: malformed offsets and blob contents degrade to the
    /// synthetic name.
    #[must_use]
    pub fn body_name(&self, body_id: usize) -> String {
        self.name_bodyadr
            .get(body_id)
            .and_then(|&adr| self.name_at(adr))
            .map_or_else(|| format!("Body_{body_id}"), str::to_owned)
    }

    /// Display name for an actuator, falling back to `Actuator_<id>`.
    #[must_use]
    pub fn actuator_name(&self, actuator_id: usize) -> String {
        self.name_actuatoradr
            .get(actuator_id)
            .and_then(|&adr| self.name_at(adr))
            .map_or_else(|| format!("Actuator_{actuator_id}"), str::to_owned)
    }

    /// Clamp a control buffer to each limited actuator's control range.
    pub fn clamp_ctrl(&self, ctrl: &mut [f64]) {
        for (i, value) in ctrl.iter_mut().enumerate().take(self.nu) {
            if self.actuator_ctrllimited.get(i).copied().unwrap_or(0) != 0 {
                let lo = self.actuator_ctrlrange[2 * i];
                let hi = self.actuator_ctrlrange[2 * i + 1];
                *value = value.clamp(lo, hi);
            }
        }
    }

    /// Allocate a zeroed state sized for this model.
    #[must_use]
    pub fn make_state(&self) -> super::state::RawState {
        super::state::RawState::new(self)
    }
}
