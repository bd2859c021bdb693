//! Per-fragment forward shading: Blinn-Phong reflectance, 3x3 PCF shadows,
//! and textured/flat albedo resolution.
//!
//! The pipeline around this crate (geometry, the shadow depth pass, texture
//! loading) hands it immutable per-draw state and a slice of interpolated
//! [`FragmentSample`]s; [`shade_batch`] returns one RGBA color per fragment.
//!
//! ```
//! use glam::{Vec2, Vec3, Vec4};
//! use lumen_shading::*;
//!
//! let light = Light::directional(Vec3::NEG_Y, Vec3::ONE);
//! let shadow_map = ShadowMap::cleared(512, 512).unwrap();
//! let material = Material::flat(Vec3::new(1.0, 0.0, 0.0));
//! let lighting = LightingContext::new(&light, ViewState::new(Vec3::Y * 5.0), &shadow_map);
//! let shader = FragmentShader::new(
//!     &material,
//!     AlbedoSource::resolve(&material, None, Vec2::ONE),
//!     lighting,
//! );
//!
//! let fragment = FragmentSample::new(Vec3::ZERO, Vec3::Y, Vec2::ZERO, Vec4::W);
//! let colors = shade_batch(&shader, &[fragment]);
//! assert!(colors[0].x > 1.0, "unclamped HDR output");
//! assert_eq!(colors[0].w, material.opacity);
//! ```

mod batch;
mod blinn_phong;
mod compose;
mod fragment;
mod light;
mod material;
pub mod post;
mod shadow;
mod texture;

pub use batch::{FragmentShader, sanitize, shade_batch, shade_into, to_rgb8, to_rgba8};
pub use blinn_phong::{LightingContext, LightingTerms, ShadingParams, evaluate, lighting_terms};
pub use compose::{RenderMode, SceneUniform, compose};
pub use fragment::{FragmentSample, ViewState};
pub use light::{Attenuation, Light, LightKind, LightUniform};
pub use material::{AlbedoSource, FLAT_MATERIAL_ID, Material, MaterialUniform};
pub use post::{Fog, FogMode, GammaCorrection, PostChain, PostContext, PostProcess, gamma_correct};
pub use shadow::{
    PCF_TAPS, ShadowMap, ShadowMapError, ShadowParams, occluded_taps, project_to_shadow_coords,
    shadow_factor,
};
pub use texture::{AddressMode, FilterMode, Sampler, Texture2d, TextureError};
