//! Depth-from-light pass producing the shadow map the fragment stage reads.

use glam::{Mat4, Vec2, Vec3};
use lumen_shading::{Light, LightKind, ShadowMap, ShadowMapError};
use rayon::prelude::*;

use crate::scene::{Ray, Scene};

/// Light view-projection that frames the whole scene.
///
/// Directional lights get an orthographic box around the scene bounds,
/// point lights a 90 degree perspective aimed at the scene center.
pub fn light_view_projection(light: &Light, scene: &Scene) -> Mat4 {
    let (center, radius) = scene.bounds();
    match light.kind {
        LightKind::Directional { direction } => {
            let dir = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
            let eye = center - dir * radius * 2.0;
            let view = Mat4::look_to_rh(eye, dir, up_for(dir));
            let proj =
                Mat4::orthographic_rh_gl(-radius, radius, -radius, radius, 0.1, radius * 4.0);
            proj * view
        }
        LightKind::Point { position } => {
            let dir = (center - position).try_normalize().unwrap_or(Vec3::NEG_Y);
            let far = position.distance(center) + radius * 2.0;
            let view = Mat4::look_to_rh(position, dir, up_for(dir));
            let proj = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.05, far.max(1.0));
            proj * view
        }
    }
}

fn up_for(dir: Vec3) -> Vec3 {
    if dir.dot(Vec3::Y).abs() > 0.99 { Vec3::Z } else { Vec3::Y }
}

/// Render a `resolution`² depth map. Row `y` covers light-space `v = (y + 0.5) / resolution`.
///
/// Texels that see no geometry keep the far-plane depth 1.0.
pub fn render_shadow_map(
    scene: &Scene,
    light_view_proj: &Mat4,
    resolution: u32,
) -> Result<ShadowMap, ShadowMapError> {
    let inverse = light_view_proj.inverse();
    let width = resolution as usize;
    let mut depths = vec![1.0_f32; width * width];

    depths
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            for (x, depth) in row.iter_mut().enumerate() {
                let uv = Vec2::new(
                    (x as f32 + 0.5) / resolution as f32,
                    (y as f32 + 0.5) / resolution as f32,
                );
                let ray = Ray::through_ndc(&inverse, uv * 2.0 - Vec2::ONE);
                if let Some((_, hit)) = scene.intersect(&ray) {
                    let clip = *light_view_proj * hit.position.extend(1.0);
                    if clip.w > 0.0 {
                        *depth = (clip.z / clip.w * 0.5 + 0.5).clamp(0.0, 1.0);
                    }
                }
            }
        });

    let covered = depths.iter().filter(|&&d| d < 1.0).count();
    tracing::debug!(resolution, covered, "shadow pass complete");
    ShadowMap::new(resolution, resolution, depths)
}
