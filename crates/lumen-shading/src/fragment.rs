//! Per-fragment inputs interpolated by the geometry stage.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Interpolated attributes of one covered pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FragmentSample {
    /// World-space position.
    pub position: Vec3,
    /// World-space normal, not necessarily unit length after interpolation.
    pub normal: Vec3,
    /// Texture coordinate before tiling.
    pub uv: Vec2,
    /// Position in the light's clip space (homogeneous).
    pub light_space_position: Vec4,
}

impl FragmentSample {
    /// Bundle already-interpolated attributes.
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2, light_space_position: Vec4) -> Self {
        Self {
            position,
            normal,
            uv,
            light_space_position,
        }
    }

    /// Build a sample, deriving the light-space position from the light's
    /// view-projection matrix.
    pub fn from_world(position: Vec3, normal: Vec3, uv: Vec2, light_view_proj: &Mat4) -> Self {
        Self::new(position, normal, uv, *light_view_proj * position.extend(1.0))
    }
}

/// Camera state needed for specular reflection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewState {
    /// Camera world-space position.
    pub camera_position: Vec3,
}

impl ViewState {
    /// View state for a camera at `camera_position`.
    pub fn new(camera_position: Vec3) -> Self {
        Self { camera_position }
    }

    /// Unit vector from `position` toward the camera (zero if coincident).
    pub fn direction_from(&self, position: Vec3) -> Vec3 {
        (self.camera_position - position).normalize_or_zero()
    }

    /// Distance from the camera to `position`.
    pub fn distance_to(&self, position: Vec3) -> f32 {
        self.camera_position.distance(position)
    }
}
