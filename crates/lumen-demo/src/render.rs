//! Forward pass: resolve visibility, then shade each object's fragments as one draw.

use glam::{Mat4, Vec2, Vec4};
use lumen_config::Config;
use lumen_shading::{
    AlbedoSource, FragmentSample, FragmentShader, Light, LightingContext, PostChain, RenderMode,
    ShadingParams, ShadowMap, ViewState, shade_batch, to_rgba8,
};
use rayon::prelude::*;
use tracing::debug;

use crate::scene::{Hit, Scene};

/// Shaded RGBA pixels, row 0 at the top.
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl Frame {
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(to_rgba8(self.pixels[(y * self.width + x) as usize]))
        })
    }
}

/// Fragments of one object plus the pixels they cover.
#[derive(Default)]
struct Draw {
    pixels: Vec<usize>,
    fragments: Vec<FragmentSample>,
}

/// Everything the forward pass needs besides the scene itself.
pub struct FrameInputs<'a> {
    pub config: &'a Config,
    pub light: &'a Light,
    pub light_view_proj: Mat4,
    pub shadow_map: &'a ShadowMap,
    pub post: &'a PostChain,
}

pub fn render(scene: &Scene, width: u32, height: u32, inputs: &FrameInputs<'_>) -> Frame {
    let camera = scene.camera;
    let inverse = camera.view_projection().inverse();

    let visibility: Vec<Option<(usize, Hit)>> = (0..width * height)
        .into_par_iter()
        .map(|i| {
            let ray = camera.pixel_ray(&inverse, i % width, i / width, width, height);
            scene.intersect(&ray)
        })
        .collect();

    let mut draws: Vec<Draw> = scene.objects.iter().map(|_| Draw::default()).collect();
    for (pixel, entry) in visibility.iter().enumerate() {
        if let Some((object, hit)) = entry {
            let draw = &mut draws[*object];
            draw.pixels.push(pixel);
            draw.fragments.push(FragmentSample::from_world(
                hit.position,
                hit.normal,
                hit.uv,
                &inputs.light_view_proj,
            ));
        }
    }

    let mode = RenderMode::from_flag(inputs.config.shading.color_mode);
    let tiling = Vec2::from_array(inputs.config.shading.uv_tiling);
    let lighting = LightingContext::new(
        inputs.light,
        ViewState::new(camera.position),
        inputs.shadow_map,
    )
    .with_params(ShadingParams::from(inputs.config));

    let mut pixels = vec![scene.background; visibility.len()];
    for (object, draw) in scene.objects.iter().zip(&draws) {
        if draw.fragments.is_empty() {
            continue;
        }
        let material = &object.material;
        let albedo = AlbedoSource::resolve(material, scene.texture_for(material), tiling);
        let shader = FragmentShader::new(material, albedo, lighting)
            .with_mode(mode)
            .with_post(inputs.post);
        let colors = shade_batch(&shader, &draw.fragments);
        for (&pixel, color) in draw.pixels.iter().zip(colors) {
            pixels[pixel] = color;
        }
        debug!(
            object = object.name,
            fragments = draw.fragments.len(),
            "draw shaded"
        );
    }

    Frame {
        width,
        height,
        pixels,
    }
}
