//! Material derivation and the single-slot material memo.
//!
//! A geom's appearance comes from its own RGBA record or, when it references
//! a material id, from the material table (color, shininess, reflectance,
//! specular, optional texture). Packed RGB textures are expanded to RGBA
//! with full alpha and repeat-wrapped; the designated ground texture (id 2)
//! gets a 50x50 uv repeat, all others 1x1.
//!
//! The memo is a one-slot cache compared by color, opacity, and texture
//! identity: homogeneous runs of geoms share one material allocation, and
//! the slot is discarded with the rest of the build state on reload.

#![allow(clippy::cast_sign_loss)] // texture ids are checked before casting

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::math::Affine2;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use rig_model::{ModelIntegrityError, RawModel};

/// Texture id that receives the large ground repeat factor.
pub const GROUND_TEXTURE_ID: i32 = 2;

/// UV repeat factor for a texture id: 50x50 for the ground texture, else 1x1.
#[must_use]
pub fn uv_repeat(texid: i32) -> f32 {
    if texid == GROUND_TEXTURE_ID {
        50.0
    } else {
        1.0
    }
}

/// Renderable appearance derived from a geom or material record.
#[derive(Debug, Clone, PartialEq)]
pub struct GeomAppearance {
    /// RGBA color; alpha below 1 renders transparent.
    pub rgba: [f32; 4],
    /// Texture id, or -1 when untextured.
    pub texid: i32,
    /// Perceptual roughness, `1 - shininess` when a material is present.
    pub roughness: f32,
    /// Metalness; fixed low value when a material is present.
    pub metallic: f32,
    /// Specular reflectance.
    pub reflectance: f32,
}

/// Memo key: color, opacity, and texture identity.
type AppearanceKey = ([u32; 4], i32);

impl GeomAppearance {
    /// Derive the appearance for `geom_index` from the model tables.
    ///
    /// Geoms without a material id use their direct color with the renderer's
    /// default surface parameters.
    #[must_use]
    pub fn resolve(model: &RawModel, geom_index: usize) -> Self {
        let matid = model.geom_matid[geom_index];
        if matid >= 0 && (matid as usize) < model.nmat {
            let m = matid as usize;
            let rgba = [
                model.mat_rgba[4 * m],
                model.mat_rgba[4 * m + 1],
                model.mat_rgba[4 * m + 2],
                model.mat_rgba[4 * m + 3],
            ];
            Self {
                rgba,
                texid: model.mat_texid[m],
                roughness: 1.0 - model.mat_shininess[m],
                metallic: 0.1,
                reflectance: model.mat_reflectance[m].max(0.5 * model.mat_specular[m]),
            }
        } else {
            let g = geom_index;
            Self {
                rgba: [
                    model.geom_rgba[4 * g],
                    model.geom_rgba[4 * g + 1],
                    model.geom_rgba[4 * g + 2],
                    model.geom_rgba[4 * g + 3],
                ],
                texid: -1,
                roughness: 0.5,
                metallic: 0.0,
                reflectance: 0.5,
            }
        }
    }

    /// Whether this appearance renders with alpha blending.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.rgba[3] < 1.0
    }

    fn key(&self) -> AppearanceKey {
        (self.rgba.map(f32::to_bits), self.texid)
    }

    /// Build the Bevy material, wiring in the expanded texture when present.
    #[must_use]
    pub fn to_standard_material(&self, texture: Option<Handle<Image>>) -> StandardMaterial {
        StandardMaterial {
            base_color: Color::srgba(self.rgba[0], self.rgba[1], self.rgba[2], self.rgba[3]),
            base_color_texture: texture,
            alpha_mode: if self.is_transparent() {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            perceptual_roughness: self.roughness.clamp(0.0, 1.0),
            metallic: self.metallic,
            reflectance: self.reflectance.clamp(0.0, 1.0),
            uv_transform: Affine2::from_scale(Vec2::splat(uv_repeat(self.texid))),
            ..Default::default()
        }
    }
}

/// One-slot cache over consecutive geom appearances.
///
/// Scoped to a single scene build; never reused across reloads.
#[derive(Debug, Default)]
pub struct MaterialMemo {
    last: Option<(AppearanceKey, usize)>,
}

impl MaterialMemo {
    /// Return the material slot for `appearance`, allocating a new one only
    /// when it differs from the previous geom's appearance.
    pub fn intern(
        &mut self,
        appearance: GeomAppearance,
        materials: &mut Vec<GeomAppearance>,
    ) -> usize {
        let key = appearance.key();
        if let Some((last_key, index)) = &self.last {
            if *last_key == key {
                return *index;
            }
        }
        materials.push(appearance);
        let index = materials.len() - 1;
        self.last = Some((key, index));
        index
    }
}

/// Expand a packed RGB texture into a repeat-wrapped RGBA image.
///
/// Every pixel gains alpha 255; the sampler repeats in both directions.
///
/// # Errors
///
/// Returns [`ModelIntegrityError::TextureRange`] when the texture's pixel
/// sub-range falls outside the shared buffer; fatal for the scene load.
pub fn expand_texture(model: &RawModel, texid: usize) -> Result<Image, ModelIntegrityError> {
    let range_err = ModelIntegrityError::TextureRange { texture: texid };
    if texid >= model.ntex {
        return Err(range_err);
    }

    let width = usize::try_from(model.tex_width[texid]).map_err(|_| range_err.clone())?;
    let height = usize::try_from(model.tex_height[texid]).map_err(|_| range_err.clone())?;
    let adr = usize::try_from(model.tex_adr[texid]).map_err(|_| range_err.clone())?;
    let pixel_count = width
        .checked_mul(height)
        .ok_or_else(|| range_err.clone())?;
    let rgb = model
        .tex_rgb
        .get(adr..adr + 3 * pixel_count)
        .ok_or(range_err)?;

    let mut rgba = Vec::with_capacity(4 * pixel_count);
    for pixel in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
    }

    #[allow(clippy::cast_possible_truncation)]
    let mut image = Image::new(
        Extent3d {
            width: width as u32,
            height: height as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        rgba,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        ..ImageSamplerDescriptor::default()
    });
    Ok(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rig_model::factories;
    use rig_model::GeomKind;

    #[test]
    fn direct_color_geoms_use_engine_defaults() {
        let model = factories::primitive(GeomKind::Sphere, [0.5, 0.0, 0.0]);
        let appearance = GeomAppearance::resolve(&model, 0);
        assert_eq!(appearance.texid, -1);
        assert_relative_eq!(appearance.roughness, 0.5);
        assert_relative_eq!(appearance.metallic, 0.0);
        assert!(!appearance.is_transparent());
    }

    #[test]
    fn material_records_drive_surface_parameters() {
        let model = factories::textured_floor();
        let appearance = GeomAppearance::resolve(&model, 0);
        assert_eq!(appearance.texid, 2);
        assert_relative_eq!(appearance.roughness, 0.8); // 1 - shininess
        assert_relative_eq!(appearance.metallic, 0.1);
        assert_relative_eq!(appearance.reflectance, 0.3f32.max(0.5 * 0.6));
    }

    #[test]
    fn memo_reuses_identical_consecutive_appearances() {
        let model = factories::primitive(GeomKind::Sphere, [0.5, 0.0, 0.0]);
        let appearance = GeomAppearance::resolve(&model, 0);
        let mut memo = MaterialMemo::default();
        let mut materials = Vec::new();

        let first = memo.intern(appearance.clone(), &mut materials);
        let second = memo.intern(appearance.clone(), &mut materials);
        assert_eq!(first, second);
        assert_eq!(materials.len(), 1);

        let mut changed = appearance;
        changed.rgba[0] += 0.25;
        let third = memo.intern(changed, &mut materials);
        assert_ne!(first, third);
        assert_eq!(materials.len(), 2);
    }

    #[test]
    fn memo_is_one_slot_deep() {
        let model = factories::primitive(GeomKind::Sphere, [0.5, 0.0, 0.0]);
        let a = GeomAppearance::resolve(&model, 0);
        let mut b = a.clone();
        b.rgba[2] = 0.9;
        let mut memo = MaterialMemo::default();
        let mut materials = Vec::new();

        memo.intern(a.clone(), &mut materials);
        memo.intern(b, &mut materials);
        // Returning to `a` is no longer a hit: the slot only remembers the
        // immediately preceding appearance.
        memo.intern(a, &mut materials);
        assert_eq!(materials.len(), 3);
    }

    #[test]
    fn transparency_follows_alpha() {
        let model = factories::primitive(GeomKind::Sphere, [0.5, 0.0, 0.0]);
        let mut appearance = GeomAppearance::resolve(&model, 0);
        appearance.rgba[3] = 0.4;
        assert!(appearance.is_transparent());
        let material = appearance.to_standard_material(None);
        assert_eq!(material.alpha_mode, AlphaMode::Blend);
    }

    #[test]
    fn texture_expansion_adds_full_alpha() {
        let model = factories::textured_floor();
        let image = expand_texture(&model, 2).unwrap();
        let data = image.data.as_ref().unwrap();
        assert_eq!(data.len(), 4 * 4); // 2x2 RGBA
        assert_eq!(&data[..4], &[200, 200, 200, 255]);
        assert_eq!(data[7], 255);
    }

    #[test]
    fn ground_texture_gets_the_large_repeat() {
        assert_relative_eq!(uv_repeat(2), 50.0);
        assert_relative_eq!(uv_repeat(0), 1.0);
        assert_relative_eq!(uv_repeat(7), 1.0);
    }

    #[test]
    fn out_of_range_texture_is_fatal() {
        let mut model = factories::textured_floor();
        model.tex_width[2] = 4096;
        assert!(matches!(
            expand_texture(&model, 2),
            Err(ModelIntegrityError::TextureRange { texture: 2 })
        ));
    }
}
