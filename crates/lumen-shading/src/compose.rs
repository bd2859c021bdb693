//! Top-level fragment composition: albedo selection, lighting, opacity.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

use crate::blinn_phong::{LightingContext, evaluate};
use crate::fragment::{FragmentSample, ViewState};
use crate::material::{AlbedoSource, Material};

/// Lit shading or the flat-albedo debug view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Full Blinn-Phong lighting.
    #[default]
    Lit,
    /// Flat material color with no lighting (picking / color-id view).
    ColorId,
}

impl RenderMode {
    /// Map the boolean color-mode flag.
    pub fn from_flag(color_mode: bool) -> Self {
        if color_mode { Self::ColorId } else { Self::Lit }
    }

    /// The boolean color-mode flag.
    pub fn is_color_id(self) -> bool {
        self == Self::ColorId
    }
}

/// Final RGBA for one fragment.
///
/// 1. `ColorId` mode returns the flat albedo.
/// 2. Otherwise the resolved [`AlbedoSource`] feeds the reflectance evaluator.
///
/// Alpha is always the material opacity.
pub fn compose(
    fragment: &FragmentSample,
    material: &Material,
    albedo: &AlbedoSource<'_>,
    mode: RenderMode,
    ctx: &LightingContext<'_>,
) -> Vec4 {
    let rgb = match mode {
        RenderMode::ColorId => material.color,
        RenderMode::Lit => evaluate(albedo.albedo(fragment.uv), fragment, material, ctx).truncate(),
    };
    rgb.extend(material.opacity)
}

/// GPU-side per-draw scene block, 32 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    /// xyz = camera world position, w = padding.
    pub camera_position: [f32; 4],
    /// Texture coordinate scale.
    pub uv_tiling: [f32; 2],
    /// 1 = color-id mode, 0 = lit.
    pub color_mode: u32,
    /// Padding to 16 bytes.
    pub _pad: u32,
}

impl SceneUniform {
    /// Pack the per-draw scene state.
    pub fn new(view: &ViewState, uv_tiling: Vec2, mode: RenderMode) -> Self {
        Self {
            camera_position: view.camera_position.extend(0.0).to_array(),
            uv_tiling: uv_tiling.to_array(),
            color_mode: u32::from(mode.is_color_id()),
            _pad: 0,
        }
    }

    /// Camera state.
    pub fn view(&self) -> ViewState {
        ViewState::new(Vec4::from_array(self.camera_position).truncate())
    }

    /// Texture coordinate scale.
    pub fn uv_tiling(&self) -> Vec2 {
        Vec2::from_array(self.uv_tiling)
    }

    /// Render mode; any non-zero flag selects the color-id view.
    pub fn render_mode(&self) -> RenderMode {
        RenderMode::from_flag(self.color_mode != 0)
    }
}
