//! Surface materials and albedo source resolution.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::texture::{Sampler, Texture2d};

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// Id used by materials without an albedo texture.
pub const FLAT_MATERIAL_ID: i32 = -1;

/// Blinn-Phong surface parameters.
///
/// `id >= 0` marks a textured surface; negative ids use the flat `color`.
/// The flat color is kept for textured materials too, since the color-id
/// debug view always shows it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Texture slot id, or negative for flat-colored surfaces.
    pub id: i32,
    /// Flat albedo (linear RGB).
    pub color: Vec3,
    /// Diffuse reflectance per channel.
    pub diffuse: Vec3,
    /// Specular reflectance per channel.
    pub specular: Vec3,
    /// Specular exponent.
    pub shininess: f32,
    /// Output alpha, never affected by lighting.
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            id: FLAT_MATERIAL_ID,
            color: Vec3::splat(0.8),
            diffuse: Vec3::ONE,
            specular: Vec3::splat(0.5),
            shininess: 32.0,
            opacity: 1.0,
        }
    }
}

impl Material {
    /// A flat-colored material with default reflectance.
    pub fn flat(color: Vec3) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// A textured material bound to texture slot `id`.
    pub fn textured(id: u16) -> Self {
        Self {
            id: i32::from(id),
            ..Self::default()
        }
    }

    /// Returns `true` when the albedo comes from a texture.
    pub fn is_textured(&self) -> bool {
        self.id >= 0
    }

    /// Build the GPU-side uniform.
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            id: self.id,
            shininess: self.shininess,
            opacity: self.opacity,
            _pad: 0.0,
            albedo: self.color.extend(0.0).to_array(),
            diffuse: self.diffuse.extend(0.0).to_array(),
            specular: self.specular.extend(0.0).to_array(),
        }
    }

    /// Decode a GPU-side uniform.
    pub fn from_uniform(uniform: &MaterialUniform) -> Self {
        let rgb = |v: [f32; 4]| Vec3::new(v[0], v[1], v[2]);
        Self {
            id: uniform.id,
            color: rgb(uniform.albedo),
            diffuse: rgb(uniform.diffuse),
            specular: rgb(uniform.specular),
            shininess: uniform.shininess,
            opacity: uniform.opacity,
        }
    }
}

/// GPU-side material block, 64 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    /// Texture slot id, negative for flat materials.
    pub id: i32,
    /// Specular exponent.
    pub shininess: f32,
    /// Output alpha.
    pub opacity: f32,
    /// Padding to 16 bytes.
    pub _pad: f32,
    /// xyz = flat albedo, w = padding.
    pub albedo: [f32; 4],
    /// xyz = diffuse reflectance, w = padding.
    pub diffuse: [f32; 4],
    /// xyz = specular reflectance, w = padding.
    pub specular: [f32; 4],
}

// ---------------------------------------------------------------------------
// AlbedoSource
// ---------------------------------------------------------------------------

/// The effective albedo of one draw, resolved once from the material id.
#[derive(Clone, Copy, Debug)]
pub enum AlbedoSource<'a> {
    /// Sample `texture` at `uv * tiling`.
    Textured {
        /// Bound albedo texture.
        texture: &'a Texture2d,
        /// Sampler state for the texture.
        sampler: Sampler,
        /// UV scale factor.
        tiling: Vec2,
    },
    /// Constant color.
    Flat(Vec3),
}

impl<'a> AlbedoSource<'a> {
    /// Pick the albedo source for `material`.
    ///
    /// Textured materials with no bound texture fall back to their flat color.
    pub fn resolve(material: &Material, texture: Option<&'a Texture2d>, tiling: Vec2) -> Self {
        match (material.is_textured(), texture) {
            (true, Some(texture)) => Self::Textured {
                texture,
                sampler: Sampler::REPEAT_LINEAR,
                tiling,
            },
            (true, None) => {
                tracing::warn!(
                    material_id = material.id,
                    "textured material has no bound texture, using flat color"
                );
                Self::Flat(material.color)
            }
            (false, _) => Self::Flat(material.color),
        }
    }

    /// Override the sampler used for textured albedo.
    pub fn with_sampler(self, sampler: Sampler) -> Self {
        match self {
            Self::Textured {
                texture, tiling, ..
            } => Self::Textured {
                texture,
                sampler,
                tiling,
            },
            flat => flat,
        }
    }

    /// Albedo at texture coordinate `uv`.
    pub fn albedo(&self, uv: Vec2) -> Vec3 {
        match self {
            Self::Textured {
                texture,
                sampler,
                tiling,
            } => texture.sample(uv * *tiling, *sampler).truncate(),
            Self::Flat(color) => *color,
        }
    }

    /// Returns `true` for the textured variant.
    pub fn is_textured(&self) -> bool {
        matches!(self, Self::Textured { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_material_uniform_size() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
        assert_eq!(std::mem::offset_of!(MaterialUniform, albedo), 16);
        assert_eq!(std::mem::offset_of!(MaterialUniform, specular), 48);
    }

    #[test]
    fn test_uniform_roundtrip_keeps_negative_id() {
        let mat = Material {
            id: -1,
            color: Vec3::new(1.0, 0.0, 0.0),
            diffuse: Vec3::new(0.5, 0.5, 0.5),
            specular: Vec3::ZERO,
            shininess: 8.0,
            opacity: 0.25,
        };
        let u = mat.to_uniform();
        assert_eq!(u.id, -1);
        assert_eq!(u.albedo, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(Material::from_uniform(&u), mat);
    }

    #[test]
    fn test_id_selects_albedo_source() {
        let tex = Texture2d::solid(2, 2, Vec4::new(0.0, 1.0, 0.0, 1.0)).unwrap();

        let flat = Material::flat(Vec3::X);
        assert!(!flat.is_textured());
        let src = AlbedoSource::resolve(&flat, Some(&tex), Vec2::ONE);
        assert!(!src.is_textured(), "negative id must ignore a bound texture");
        assert_eq!(src.albedo(Vec2::splat(0.5)), Vec3::X);

        let textured = Material::textured(0);
        let src = AlbedoSource::resolve(&textured, Some(&tex), Vec2::ONE);
        assert!(src.is_textured());
        assert_eq!(src.albedo(Vec2::splat(0.5)), Vec3::Y);
    }

    #[test]
    fn test_textured_without_texture_falls_back_to_flat() {
        let mut mat = Material::textured(3);
        mat.color = Vec3::Z;
        let src = AlbedoSource::resolve(&mat, None, Vec2::ONE);
        assert!(!src.is_textured());
        assert_eq!(src.albedo(Vec2::ZERO), Vec3::Z);
    }

    #[test]
    fn test_tiling_scales_uv() {
        // Left column red, right column blue.
        let tex = Texture2d::from_fn(2, 1, |x, _| {
            if x == 0 {
                Vec4::new(1.0, 0.0, 0.0, 1.0)
            } else {
                Vec4::new(0.0, 0.0, 1.0, 1.0)
            }
        })
        .unwrap();
        let src = AlbedoSource::resolve(&Material::textured(0), Some(&tex), Vec2::new(2.0, 1.0))
            .with_sampler(Sampler {
                address_mode: crate::AddressMode::Repeat,
                filter: crate::FilterMode::Nearest,
            });
        // uv.x = 0.3 -> 0.6 after tiling -> right column.
        assert_eq!(src.albedo(Vec2::new(0.3, 0.5)), Vec3::Z);
        // uv.x = 0.6 -> 1.2 -> wraps to 0.2 -> left column.
        assert_eq!(src.albedo(Vec2::new(0.6, 0.5)), Vec3::X);
    }
}
