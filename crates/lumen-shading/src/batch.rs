//! Data-parallel execution of one draw's fragments.
//!
//! Every fragment is an independent invocation over read-only draw state, so
//! batches are split across the rayon pool without synchronization. A
//! fragment whose result is not finite is replaced by a defined fallback
//! instead of poisoning the output.

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::blinn_phong::LightingContext;
use crate::compose::{RenderMode, compose};
use crate::fragment::FragmentSample;
use crate::material::{AlbedoSource, Material};
use crate::post::{PostChain, PostContext};

/// Read-only state of one draw call.
#[derive(Clone, Copy, Debug)]
pub struct FragmentShader<'a> {
    /// Surface material.
    pub material: &'a Material,
    /// Albedo source resolved from the material.
    pub albedo: AlbedoSource<'a>,
    /// Lit or color-id.
    pub mode: RenderMode,
    /// Light, camera, shadow map and constants.
    pub lighting: LightingContext<'a>,
    /// Optional post steps. Skipped in color-id mode.
    pub post: Option<&'a PostChain>,
}

impl<'a> FragmentShader<'a> {
    /// Lit shader with no post steps.
    pub fn new(
        material: &'a Material,
        albedo: AlbedoSource<'a>,
        lighting: LightingContext<'a>,
    ) -> Self {
        Self {
            material,
            albedo,
            mode: RenderMode::Lit,
            lighting,
            post: None,
        }
    }

    /// Set the render mode.
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach a post chain.
    pub fn with_post(mut self, post: &'a PostChain) -> Self {
        self.post = Some(post);
        self
    }

    /// Shade a single fragment.
    pub fn shade(&self, fragment: &FragmentSample) -> Vec4 {
        let color = compose(
            fragment,
            self.material,
            &self.albedo,
            self.mode,
            &self.lighting,
        );
        match (self.mode, self.post) {
            (RenderMode::Lit, Some(post)) if !post.is_empty() => {
                let ctx = PostContext {
                    view_distance: self.lighting.view.distance_to(fragment.position),
                };
                post.apply(color, &ctx)
            }
            _ => color,
        }
    }
}

/// Replace non-finite channels: RGB by 0, alpha by `opacity`.
///
/// Returns the cleaned color and whether anything was replaced.
pub fn sanitize(color: Vec4, opacity: f32) -> (Vec4, bool) {
    if color.is_finite() {
        return (color, false);
    }
    let fix = |c: f32, fallback: f32| if c.is_finite() { c } else { fallback };
    let cleaned = Vec4::new(
        fix(color.x, 0.0),
        fix(color.y, 0.0),
        fix(color.z, 0.0),
        fix(color.w, opacity),
    );
    (cleaned, true)
}

/// Shade `fragments` in parallel into `out`, which must have the same length.
///
/// Returns the number of fragments that had to be sanitized.
///
/// # Panics
///
/// Panics if `out.len() != fragments.len()`.
pub fn shade_into(
    shader: &FragmentShader<'_>,
    fragments: &[FragmentSample],
    out: &mut [Vec4],
) -> usize {
    assert_eq!(
        fragments.len(),
        out.len(),
        "output buffer must match fragment count"
    );
    let sanitized = AtomicUsize::new(0);
    let opacity = shader.material.opacity;

    out.par_iter_mut()
        .zip(fragments.par_iter())
        .for_each(|(slot, fragment)| {
            let (color, replaced) = sanitize(shader.shade(fragment), opacity);
            if replaced {
                sanitized.fetch_add(1, Ordering::Relaxed);
            }
            *slot = color;
        });

    let sanitized = sanitized.into_inner();
    if sanitized > 0 {
        tracing::warn!(
            sanitized,
            total = fragments.len(),
            "replaced non-finite fragment colors"
        );
    }
    sanitized
}

/// Shade `fragments` in parallel.
pub fn shade_batch(shader: &FragmentShader<'_>, fragments: &[FragmentSample]) -> Vec<Vec4> {
    let mut out = vec![Vec4::ZERO; fragments.len()];
    shade_into(shader, fragments, &mut out);
    tracing::debug!(
        fragments = fragments.len(),
        mode = ?shader.mode,
        textured = shader.albedo.is_textured(),
        "shaded batch"
    );
    out
}

/// Quantize to 8-bit RGBA, saturating to `[0, 1]`.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    [
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        c.w.round() as u8,
    ]
}

/// Quantize RGB to 8 bits and drop alpha.
pub fn to_rgb8(color: Vec3) -> [u8; 3] {
    let [r, g, b, _] = to_rgba8(color.extend(1.0));
    [r, g, b]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::ViewState;
    use crate::light::Light;
    use crate::post::GammaCorrection;
    use crate::shadow::ShadowMap;
    use crate::texture::{Sampler, Texture2d};
    use glam::Vec2;

    fn grid(n: usize) -> Vec<FragmentSample> {
        (0..n)
            .map(|i| {
                let x = i as f32 * 0.1;
                FragmentSample::new(
                    Vec3::new(x, 0.0, 0.0),
                    Vec3::Y,
                    Vec2::new(x, 0.0),
                    Vec4::new(0.0, 0.0, 0.0, 1.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_batch_matches_serial_shading() {
        let light = Light::directional(Vec3::new(0.3, -1.0, 0.2), Vec3::ONE);
        let map = ShadowMap::cleared(8, 8).unwrap();
        let mat = Material::flat(Vec3::new(0.7, 0.2, 0.1));
        let ctx = LightingContext::new(&light, ViewState::new(Vec3::new(0.0, 4.0, 4.0)), &map);
        let shader = FragmentShader::new(&mat, AlbedoSource::resolve(&mat, None, Vec2::ONE), ctx);

        let fragments = grid(1000);
        let batch = shade_batch(&shader, &fragments);
        assert_eq!(batch.len(), fragments.len());
        for (f, c) in fragments.iter().zip(&batch) {
            assert_eq!(*c, shader.shade(f));
        }
    }

    #[test]
    fn test_nan_fragment_does_not_affect_neighbours() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE);
        let map = ShadowMap::cleared(8, 8).unwrap();
        let mut mat = Material::textured(0);
        mat.opacity = 0.8;
        // The middle texel is corrupt.
        let tex = Texture2d::from_fn(3, 1, |x, _| if x == 1 { Vec4::NAN } else { Vec4::ONE })
            .unwrap();
        let albedo = AlbedoSource::resolve(&mat, Some(&tex), Vec2::ONE)
            .with_sampler(Sampler::CLAMP_NEAREST);
        let ctx = LightingContext::new(&light, ViewState::new(Vec3::Y * 2.0), &map);
        let shader = FragmentShader::new(&mat, albedo, ctx);

        let mut fragments = grid(3);
        for (i, f) in fragments.iter_mut().enumerate() {
            f.uv = Vec2::new((i as f32 + 0.5) / 3.0, 0.5);
        }
        let mut out = vec![Vec4::ZERO; 3];
        let sanitized = shade_into(&shader, &fragments, &mut out);

        assert_eq!(sanitized, 1);
        assert!(out.iter().all(|c| c.is_finite()));
        assert_eq!(out[1].w, 0.8);
        assert_eq!(out[0], shader.shade(&fragments[0]));
        assert_eq!(out[2], shader.shade(&fragments[2]));
    }

    #[test]
    fn test_extreme_tiling_shades_every_fragment() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE);
        let map = ShadowMap::cleared(8, 8).unwrap();
        let mat = Material::textured(0);
        let tex = Texture2d::solid(2, 2, Vec4::ONE).unwrap();
        let albedo = AlbedoSource::resolve(&mat, Some(&tex), Vec2::splat(1.0e19));
        let ctx = LightingContext::new(&light, ViewState::new(Vec3::Y * 2.0), &map);
        let shader = FragmentShader::new(&mat, albedo, ctx);

        let mut fragments = grid(2);
        fragments[0].uv = Vec2::new(0.5, 0.5);
        fragments[1].uv = Vec2::ZERO;
        let out = shade_batch(&shader, &fragments);

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.is_finite()), "got {out:?}");
        assert_eq!(out[1], shader.shade(&fragments[1]));
    }

    #[test]
    fn test_color_mode_skips_post_chain() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE);
        let map = ShadowMap::cleared(8, 8).unwrap();
        let mat = Material::flat(Vec3::new(0.25, 0.5, 0.75));
        let ctx = LightingContext::new(&light, ViewState::new(Vec3::Y), &map);
        let mut chain = PostChain::new();
        chain.push(GammaCorrection { gamma: 2.2 });
        let shader = FragmentShader::new(&mat, AlbedoSource::resolve(&mat, None, Vec2::ONE), ctx)
            .with_post(&chain)
            .with_mode(RenderMode::ColorId);

        let out = shader.shade(&grid(1)[0]);
        assert_eq!(out, Vec4::new(0.25, 0.5, 0.75, 1.0));
    }

    #[test]
    fn test_lit_mode_applies_post_chain() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE);
        let map = ShadowMap::cleared(8, 8).unwrap();
        let mat = Material::flat(Vec3::splat(0.2));
        let ctx = LightingContext::new(&light, ViewState::new(Vec3::Y), &map);
        let mut chain = PostChain::new();
        chain.push(GammaCorrection { gamma: 2.2 });
        let plain = FragmentShader::new(&mat, AlbedoSource::resolve(&mat, None, Vec2::ONE), ctx);
        let corrected = plain.with_post(&chain);

        let f = grid(1)[0];
        let a = plain.shade(&f);
        let b = corrected.shade(&f);
        assert!(b.x > a.x, "gamma should brighten {} -> {}", a.x, b.x);
        assert_eq!(a.w, b.w);
    }

    #[test]
    #[should_panic(expected = "output buffer must match")]
    fn test_shade_into_length_mismatch_panics() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE);
        let map = ShadowMap::cleared(1, 1).unwrap();
        let mat = Material::default();
        let ctx = LightingContext::new(&light, ViewState::default(), &map);
        let shader = FragmentShader::new(&mat, AlbedoSource::Flat(mat.color), ctx);
        let mut out = vec![Vec4::ZERO; 2];
        shade_into(&shader, &grid(3), &mut out);
    }

    #[test]
    fn test_to_rgba8_saturates() {
        assert_eq!(to_rgba8(Vec4::new(1.1, -0.5, 0.5, 1.0)), [255, 0, 128, 255]);
        assert_eq!(to_rgb8(Vec3::new(0.0, 1.0, 2.0)), [0, 255, 255]);
    }

    #[test]
    fn test_sanitize_leaves_finite_colors() {
        let c = Vec4::new(3.0, 0.0, 1.0, 0.5);
        assert_eq!(sanitize(c, 1.0), (c, false));
    }
}
