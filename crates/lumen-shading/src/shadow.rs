//! Shadow map storage and the percentage-closer shadow factor estimator.
//!
//! The shadow map is produced by an earlier depth pass rendered from the light
//! and is frozen while fragments are shaded. Lookups use clamp-to-edge
//! addressing, so PCF taps that fall off the map reuse the border texels.

use glam::{IVec2, Vec2, Vec3, Vec4};
use lumen_config::ShadowConfig;
use thiserror::Error;

use crate::texture::{Sampler, finite_uv};

/// Number of taps in the 3x3 PCF kernel.
pub const PCF_TAPS: u32 = 9;

/// Errors returned while building a shadow map.
#[derive(Debug, Error)]
pub enum ShadowMapError {
    /// Width or height is zero.
    #[error("shadow map dimensions must be non-zero, got {width}x{height}")]
    ZeroSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Depth data does not match the dimensions.
    #[error("expected {expected} depth values, got {actual}")]
    DataLength {
        /// `width * height`.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
}

// ---------------------------------------------------------------------------
// ShadowParams
// ---------------------------------------------------------------------------

/// Depth-bias parameters for the shadow comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowParams {
    /// Slope factor, multiplied by `1 - dot(N, L)`.
    pub bias_scale: f32,
    /// Lower bound of the bias, applied to surfaces facing the light.
    pub min_bias: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            bias_scale: 0.0001,
            min_bias: 0.00001,
        }
    }
}

impl From<&ShadowConfig> for ShadowParams {
    fn from(config: &ShadowConfig) -> Self {
        Self {
            bias_scale: config.bias_scale,
            min_bias: config.min_bias,
        }
    }
}

impl ShadowParams {
    /// Depth bias for a surface whose normal makes `dot(N, L) = n_dot_l` with the light.
    ///
    /// Grows as the surface turns edge-on to the light, where a constant bias
    /// is not enough to suppress acne.
    pub fn bias(&self, n_dot_l: f32) -> f32 {
        (self.bias_scale * (1.0 - n_dot_l)).max(self.min_bias)
    }
}

// ---------------------------------------------------------------------------
// ShadowMap
// ---------------------------------------------------------------------------

/// Depth-from-light texture in `[0, 1]` normalized depth.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowMap {
    width: u32,
    height: u32,
    depths: Vec<f32>,
}

impl ShadowMap {
    /// Wrap row-major depth values.
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> Result<Self, ShadowMapError> {
        if width == 0 || height == 0 {
            return Err(ShadowMapError::ZeroSize { width, height });
        }
        let expected = width as usize * height as usize;
        if depths.len() != expected {
            return Err(ShadowMapError::DataLength {
                expected,
                actual: depths.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depths,
        })
    }

    /// A map cleared to the far plane (depth 1.0): nothing casts a shadow.
    pub fn cleared(width: u32, height: u32) -> Result<Self, ShadowMapError> {
        Self::new(width, height, vec![1.0; width as usize * height as usize])
    }

    /// Build a map by evaluating `f(x, y)` for every texel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> f32,
    ) -> Result<Self, ShadowMapError> {
        let mut depths = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                depths.push(f(x, y));
            }
        }
        Self::new(width, height, depths)
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major depths.
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Size of one texel in normalized coordinates.
    pub fn texel_size(&self) -> Vec2 {
        Vec2::new(1.0 / self.width as f32, 1.0 / self.height as f32)
    }

    /// Stored depth at integer texel coordinates, clamped to the edge.
    pub fn depth_at(&self, texel: IVec2) -> f32 {
        let s = Sampler::CLAMP_NEAREST;
        let x = s.wrap(i64::from(texel.x), self.width);
        let y = s.wrap(i64::from(texel.y), self.height);
        self.depths[y * self.width as usize + x]
    }

    /// Nearest, clamp-to-edge depth lookup at normalized coordinates.
    pub fn sample(&self, uv: Vec2) -> f32 {
        let uv = finite_uv(uv);
        let x = (uv.x * self.width as f32).floor() as i64;
        let y = (uv.y * self.height as f32).floor() as i64;
        let s = Sampler::CLAMP_NEAREST;
        self.depths[s.wrap(y, self.height) * self.width as usize + s.wrap(x, self.width)]
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Map a light-space clip position to shadow-map coordinates.
///
/// Performs the perspective divide and remaps `[-1, 1]` to `[0, 1]` on all
/// three axes. Returns `None` when `w <= 0` (behind the light's projection
/// center) or any component is non-finite.
pub fn project_to_shadow_coords(light_space: Vec4) -> Option<Vec3> {
    if !light_space.is_finite() || light_space.w <= 0.0 {
        return None;
    }
    let ndc = light_space.truncate() / light_space.w;
    let coords = ndc * 0.5 + Vec3::splat(0.5);
    coords.is_finite().then_some(coords)
}

/// Number of PCF taps (0..=9) whose stored depth is closer to the light than
/// the fragment, after biasing. `None` when the fragment is unshadowed by
/// definition (invalid projection or beyond the far plane).
pub fn occluded_taps(
    map: &ShadowMap,
    light_space: Vec4,
    normal: Vec3,
    light_dir: Vec3,
    params: &ShadowParams,
) -> Option<u32> {
    let coords = project_to_shadow_coords(light_space)?;
    if coords.z > 1.0 {
        return None;
    }

    let bias = params.bias(normal.dot(light_dir));
    let current = coords.z - bias;
    let texel = map.texel_size();

    let mut occluded = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let offset = Vec2::new(dx as f32, dy as f32) * texel;
            let closest = map.sample(coords.truncate() + offset);
            if current > closest {
                occluded += 1;
            }
        }
    }
    Some(occluded)
}

/// Fraction of the 3x3 neighbourhood in shadow: 0 = fully lit, 1 = fully shadowed.
///
/// `normal` and `light_dir` must be normalized; `light_dir` points from the
/// surface toward the light. Fragments beyond the light's far plane, behind
/// its projection (`w <= 0`) or with non-finite coordinates are unshadowed.
pub fn shadow_factor(
    map: &ShadowMap,
    light_space: Vec4,
    normal: Vec3,
    light_dir: Vec3,
    params: &ShadowParams,
) -> f32 {
    match occluded_taps(map, light_space, normal, light_dir, params) {
        Some(taps) => taps as f32 / PCF_TAPS as f32,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: Vec3 = Vec3::Y;

    fn light_space_at(uv: Vec2, depth: f32) -> Vec4 {
        // Inverse of the [0,1] remap with w = 1.
        Vec4::new(uv.x * 2.0 - 1.0, uv.y * 2.0 - 1.0, depth * 2.0 - 1.0, 1.0)
    }

    #[test]
    fn test_bias_is_minimum_when_facing_light() {
        let params = ShadowParams::default();
        assert!((params.bias(1.0) - params.min_bias).abs() < 1e-12);
    }

    #[test]
    fn test_bias_grows_at_grazing_angles() {
        let params = ShadowParams::default();
        let facing = params.bias(0.9);
        let grazing = params.bias(0.0);
        assert!(grazing > facing);
        assert!((grazing - 0.0001).abs() < 1e-9);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            ShadowMap::cleared(0, 8),
            Err(ShadowMapError::ZeroSize { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(matches!(
            ShadowMap::new(2, 2, vec![1.0; 3]),
            Err(ShadowMapError::DataLength {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_projection_remaps_ndc_to_unit_cube() {
        let coords = project_to_shadow_coords(Vec4::new(-2.0, 2.0, 0.0, 2.0)).unwrap();
        assert!((coords - Vec3::new(0.0, 1.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_projection_rejects_non_positive_w() {
        assert!(project_to_shadow_coords(Vec4::new(0.1, 0.1, 0.1, 0.0)).is_none());
        assert!(project_to_shadow_coords(Vec4::new(0.1, 0.1, 0.1, -1.0)).is_none());
        assert!(project_to_shadow_coords(Vec4::new(f32::NAN, 0.1, 0.1, 1.0)).is_none());
    }

    #[test]
    fn test_cleared_map_casts_no_shadow() {
        let map = ShadowMap::cleared(16, 16).unwrap();
        let s = shadow_factor(
            &map,
            light_space_at(Vec2::splat(0.5), 0.7),
            UP,
            UP,
            &ShadowParams::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_fully_occluded_neighbourhood() {
        let map = ShadowMap::new(16, 16, vec![0.2; 256]).unwrap();
        let s = shadow_factor(
            &map,
            light_space_at(Vec2::splat(0.5), 0.7),
            UP,
            UP,
            &ShadowParams::default(),
        );
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_beyond_far_plane_is_unshadowed() {
        let map = ShadowMap::new(4, 4, vec![0.0; 16]).unwrap();
        let s = shadow_factor(
            &map,
            light_space_at(Vec2::splat(0.5), 1.01),
            UP,
            UP,
            &ShadowParams::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_behind_light_is_unshadowed() {
        let map = ShadowMap::new(4, 4, vec![0.0; 16]).unwrap();
        let s = shadow_factor(
            &map,
            Vec4::new(0.0, 0.0, 0.5, -1.0),
            UP,
            UP,
            &ShadowParams::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_shadow_edge_is_partial() {
        // Left half occluded (depth 0.1), right half clear.
        let map = ShadowMap::from_fn(8, 8, |x, _| if x < 4 { 0.1 } else { 1.0 }).unwrap();
        // Center of texel column 4: its left neighbour (column 3) is occluded.
        let uv = Vec2::new(4.5 / 8.0, 0.5);
        let taps = occluded_taps(
            &map,
            light_space_at(uv, 0.5),
            UP,
            UP,
            &ShadowParams::default(),
        )
        .unwrap();
        assert_eq!(taps, 3, "one occluded column of three taps");
        let s = shadow_factor(
            &map,
            light_space_at(uv, 0.5),
            UP,
            UP,
            &ShadowParams::default(),
        );
        assert!((s - 3.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_bias_prevents_self_shadowing() {
        // Stored depth equals the fragment's own depth: the receiver is the caster.
        let map = ShadowMap::new(4, 4, vec![0.5; 16]).unwrap();
        let s = shadow_factor(
            &map,
            light_space_at(Vec2::splat(0.5), 0.5),
            UP,
            UP,
            &ShadowParams::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_border_taps_clamp_to_edge() {
        // Only the corner texel is occluded; a fragment in that corner sees it
        // through four clamped taps (itself, and three clamped neighbours).
        let map = ShadowMap::from_fn(4, 4, |x, y| if x == 0 && y == 0 { 0.0 } else { 1.0 })
            .unwrap();
        let taps = occluded_taps(
            &map,
            light_space_at(Vec2::new(0.125, 0.125), 0.5),
            UP,
            UP,
            &ShadowParams::default(),
        )
        .unwrap();
        assert_eq!(taps, 4);
    }

    #[test]
    fn test_factor_is_multiple_of_one_ninth() {
        let map = ShadowMap::from_fn(8, 8, |x, y| ((x * 7 + y * 3) % 5) as f32 / 5.0).unwrap();
        for i in 0..20 {
            let uv = Vec2::new(i as f32 / 20.0, 1.0 - i as f32 / 23.0);
            let s = shadow_factor(
                &map,
                light_space_at(uv, 0.45),
                UP,
                UP,
                &ShadowParams::default(),
            );
            let scaled = s * 9.0;
            assert!(
                (scaled - scaled.round()).abs() < 1e-5,
                "shadow factor {s} is not k/9"
            );
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_params_from_config() {
        let config = ShadowConfig {
            resolution: 256,
            bias_scale: 0.5,
            min_bias: 0.25,
        };
        let params = ShadowParams::from(&config);
        assert_eq!(params.bias_scale, 0.5);
        assert_eq!(params.min_bias, 0.25);
    }
}
