//! Blinn-Phong reflectance with shadowed direct lighting.
//!
//! `color = (ambient + attenuation * (1 - shadow) * (diffuse + specular)) * albedo`
//!
//! Ambient is never shadowed. Results are not clamped: values above 1 are
//! left for tone mapping downstream.

use glam::{Vec3, Vec4};
use lumen_config::Config;

use crate::fragment::{FragmentSample, ViewState};
use crate::light::Light;
use crate::material::Material;
use crate::shadow::{ShadowMap, ShadowParams, shadow_factor};

/// Tunable constants of the reflectance model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingParams {
    /// Fraction of the light color used as flat ambient.
    pub ambient_strength: f32,
    /// Shadow comparison bias.
    pub shadow: ShadowParams,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            ambient_strength: 0.1,
            shadow: ShadowParams::default(),
        }
    }
}

impl From<&Config> for ShadingParams {
    fn from(config: &Config) -> Self {
        Self {
            ambient_strength: config.shading.ambient_strength,
            shadow: ShadowParams::from(&config.shadow),
        }
    }
}

/// Everything the evaluator reads besides the fragment and material.
#[derive(Clone, Copy, Debug)]
pub struct LightingContext<'a> {
    /// The scene light.
    pub light: &'a Light,
    /// Camera state.
    pub view: ViewState,
    /// Depth-from-light texture.
    pub shadow_map: &'a ShadowMap,
    /// Model constants.
    pub params: ShadingParams,
}

impl<'a> LightingContext<'a> {
    /// Context with default [`ShadingParams`].
    pub fn new(light: &'a Light, view: ViewState, shadow_map: &'a ShadowMap) -> Self {
        Self {
            light,
            view,
            shadow_map,
            params: ShadingParams::default(),
        }
    }

    /// Replace the model constants.
    pub fn with_params(mut self, params: ShadingParams) -> Self {
        self.params = params;
        self
    }
}

/// Intermediate terms of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingTerms {
    /// `light.color * ambient_strength`.
    pub ambient: Vec3,
    /// Lambertian term.
    pub diffuse: Vec3,
    /// Half-vector specular term.
    pub specular: Vec3,
    /// Distance falloff in `[0, 1]`.
    pub attenuation: f32,
    /// Shadowed fraction in `[0, 1]`.
    pub shadow: f32,
}

impl LightingTerms {
    /// Combine the terms and modulate by `albedo`.
    pub fn combine(&self, albedo: Vec3) -> Vec3 {
        let direct = self.attenuation * (1.0 - self.shadow) * (self.diffuse + self.specular);
        (self.ambient + direct) * albedo
    }
}

/// Evaluate the ambient, diffuse, specular, attenuation and shadow terms.
pub fn lighting_terms(
    fragment: &FragmentSample,
    material: &Material,
    ctx: &LightingContext<'_>,
) -> LightingTerms {
    let light = ctx.light;
    let ambient = light.color * ctx.params.ambient_strength;

    let n = fragment.normal.normalize_or_zero();
    let l = light.direction_from(fragment.position);
    let n_dot_l = n.dot(l).max(0.0);
    let diffuse = n_dot_l * material.diffuse * light.color;

    let v = ctx.view.direction_from(fragment.position);
    let h = (l + v).normalize_or_zero();
    let v_dot_h = v.dot(h);
    // Guarded so that a zero exponent cannot turn 0^0 into a highlight.
    let specular = if v_dot_h > 0.0 {
        v_dot_h.powf(material.shininess) * material.specular * light.color
    } else {
        Vec3::ZERO
    };

    let attenuation = light.attenuation_at(fragment.position);
    let shadow = shadow_factor(
        ctx.shadow_map,
        fragment.light_space_position,
        n,
        l,
        &ctx.params.shadow,
    );

    LightingTerms {
        ambient,
        diffuse,
        specular,
        attenuation,
        shadow,
    }
}

/// Lit color for `albedo`. Alpha is always 1; the caller applies opacity.
pub fn evaluate(
    albedo: Vec3,
    fragment: &FragmentSample,
    material: &Material,
    ctx: &LightingContext<'_>,
) -> Vec4 {
    lighting_terms(fragment, material, ctx)
        .combine(albedo)
        .extend(1.0)
}
