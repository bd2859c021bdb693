//! Analytic demo scene: a textured ground plane with spheres on top.
//!
//! Primary visibility and the shadow pass both ray cast this scene, which
//! stands in for rasterization when producing fragments.

use glam::{Mat4, Vec2, Vec3, Vec4};
use lumen_shading::{Material, Texture2d, TextureError};

const HIT_EPSILON: f32 = 1e-4;

/// A ray with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray through an NDC point of the frustum described by `inverse_view_proj`.
    pub fn through_ndc(inverse_view_proj: &Mat4, ndc: Vec2) -> Self {
        let near = inverse_view_proj.project_point3(ndc.extend(-1.0));
        let far = inverse_view_proj.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }
}

/// Surface attributes at a ray hit, the data a rasterizer would interpolate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub t: f32,
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Square patch of the plane `y = height`, spanning `[-extent, extent]` in x and z.
    Ground { height: f32, extent: f32 },
    Sphere { center: Vec3, radius: f32 },
}

impl Shape {
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        match *self {
            Shape::Ground { height, extent } => {
                if ray.direction.y.abs() < 1e-6 {
                    return None;
                }
                let t = (height - ray.origin.y) / ray.direction.y;
                if t <= HIT_EPSILON {
                    return None;
                }
                let position = ray.at(t);
                if position.x.abs() > extent || position.z.abs() > extent {
                    return None;
                }
                let uv = (Vec2::new(position.x, position.z) + extent) / (2.0 * extent);
                Some(Hit {
                    t,
                    position,
                    normal: Vec3::Y,
                    uv,
                })
            }
            Shape::Sphere { center, radius } => {
                let oc = ray.origin - center;
                let b = oc.dot(ray.direction);
                let c = oc.length_squared() - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                let t = [-b - root, -b + root]
                    .into_iter()
                    .find(|&t| t > HIT_EPSILON)?;
                let position = ray.at(t);
                let normal = (position - center) / radius;
                let uv = Vec2::new(
                    0.5 + normal.z.atan2(normal.x) / std::f32::consts::TAU,
                    0.5 - normal.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI,
                );
                Some(Hit {
                    t,
                    position,
                    normal,
                    uv,
                })
            }
        }
    }
}

/// One draw: geometry plus its material.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: &'static str,
    pub shape: Shape,
    pub material: Material,
}

/// Pinhole camera.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn view_projection(&self) -> Mat4 {
        let proj = Mat4::perspective_rh_gl(self.fov_y, self.aspect, 0.1, 100.0);
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        proj * view
    }

    /// Primary ray through the center of pixel `(x, y)`; row 0 is the top.
    pub fn pixel_ray(
        &self,
        inverse_view_proj: &Mat4,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Ray {
        let ndc = Vec2::new(
            (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
            1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
        );
        Ray::through_ndc(inverse_view_proj, ndc)
    }
}

pub struct Scene {
    pub objects: Vec<SceneObject>,
    /// Albedo textures indexed by material id.
    pub textures: Vec<Texture2d>,
    pub camera: Camera,
    pub background: Vec4,
}

impl Scene {
    /// Checkered ground, a flat red sphere and a textured sphere.
    pub fn demo(aspect: f32) -> Result<Self, TextureError> {
        let checker = Texture2d::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Vec4::new(0.9, 0.9, 0.85, 1.0)
            } else {
                Vec4::new(0.25, 0.3, 0.35, 1.0)
            }
        })?;
        let stripes = Texture2d::from_fn(32, 32, |x, _| {
            if (x / 4) % 2 == 0 {
                Vec4::new(0.1, 0.4, 0.9, 1.0)
            } else {
                Vec4::new(0.95, 0.8, 0.2, 1.0)
            }
        })?;

        let ground = Material {
            specular: Vec3::splat(0.1),
            shininess: 8.0,
            ..Material::textured(0)
        };
        let red = Material {
            specular: Vec3::splat(0.6),
            shininess: 64.0,
            ..Material::flat(Vec3::new(0.9, 0.1, 0.1))
        };
        let striped = Material {
            specular: Vec3::splat(0.3),
            ..Material::textured(1)
        };

        Ok(Self {
            objects: vec![
                SceneObject {
                    name: "ground",
                    shape: Shape::Ground {
                        height: 0.0,
                        extent: 4.0,
                    },
                    material: ground,
                },
                SceneObject {
                    name: "red_sphere",
                    shape: Shape::Sphere {
                        center: Vec3::new(-0.6, 0.75, 0.0),
                        radius: 0.75,
                    },
                    material: red,
                },
                SceneObject {
                    name: "striped_sphere",
                    shape: Shape::Sphere {
                        center: Vec3::new(1.1, 0.5, 0.8),
                        radius: 0.5,
                    },
                    material: striped,
                },
            ],
            textures: vec![checker, stripes],
            camera: Camera {
                position: Vec3::new(0.0, 3.0, 6.0),
                target: Vec3::new(0.0, 0.5, 0.0),
                fov_y: 45f32.to_radians(),
                aspect,
            },
            background: Vec4::new(0.05, 0.05, 0.08, 1.0),
        })
    }

    /// Albedo texture bound to `material`, if any.
    pub fn texture_for(&self, material: &Material) -> Option<&Texture2d> {
        usize::try_from(material.id)
            .ok()
            .and_then(|slot| self.textures.get(slot))
    }

    /// Center and radius of a sphere enclosing every object.
    pub fn bounds(&self) -> (Vec3, f32) {
        let center = Vec3::new(0.0, 0.5, 0.0);
        let radius = self
            .objects
            .iter()
            .map(|object| match object.shape {
                Shape::Ground { height, extent } => {
                    Vec3::new(extent, height, extent).distance(center)
                }
                Shape::Sphere { center: c, radius } => c.distance(center) + radius,
            })
            .fold(0.0, f32::max);
        (center, radius)
    }

    /// Nearest hit along `ray` and the index of the object hit.
    pub fn intersect(&self, ray: &Ray) -> Option<(usize, Hit)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, object)| object.shape.intersect(ray).map(|hit| (i, hit)))
            .min_by(|a, b| a.1.t.total_cmp(&b.1.t))
    }
}
