//! The single scene light: point or directional.
//!
//! On the GPU side the kind is packed into the `w` component of one vector
//! (`1` = point, position in `xyz`; `0` = directional, travel direction in
//! `xyz`). [`Light`] keeps that as an explicit [`LightKind`]; the packed form
//! only exists in [`LightUniform`].

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use lumen_config::{LightConfig, LightKindConfig};

/// Constant, linear and quadratic distance falloff coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    /// Distance-independent term.
    pub constant: f32,
    /// Term proportional to distance.
    pub linear: f32,
    /// Term proportional to distance squared.
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl Attenuation {
    /// No falloff at all.
    pub const NONE: Self = Self {
        constant: 1.0,
        linear: 0.0,
        quadratic: 0.0,
    };

    /// Build from an `[a0, a1, a2]` triple.
    pub fn from_array(coefficients: [f32; 3]) -> Self {
        Self {
            constant: coefficients[0],
            linear: coefficients[1],
            quadratic: coefficients[2],
        }
    }

    /// Pack as an `[a0, a1, a2]` triple.
    pub fn to_array(self) -> [f32; 3] {
        [self.constant, self.linear, self.quadratic]
    }

    /// Intensity multiplier at `distance`: `min(1 / (a0 + a1*d + a2*d^2), 1)`.
    ///
    /// Never amplifies. A non-positive or NaN denominator, which only arises
    /// from invalid coefficients, yields 1.
    pub fn factor(&self, distance: f32) -> f32 {
        let denom = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denom.is_nan() || denom <= 0.0 {
            return 1.0;
        }
        (1.0 / denom).min(1.0)
    }
}

/// Where the light is, or which way it shines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Localized light at a world-space position.
    Point {
        /// World-space position.
        position: Vec3,
    },
    /// Infinitely distant light.
    Directional {
        /// Direction the light travels (from the light toward the scene).
        direction: Vec3,
    },
}

/// A light source as seen by the shading stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    /// Point or directional.
    pub kind: LightKind,
    /// Linear RGB color, intensity premultiplied.
    pub color: Vec3,
    /// Distance falloff, ignored for directional lights.
    pub attenuation: Attenuation,
}

impl Light {
    /// A point light.
    pub fn point(position: Vec3, color: Vec3, attenuation: Attenuation) -> Self {
        Self {
            kind: LightKind::Point { position },
            color,
            attenuation,
        }
    }

    /// A directional light traveling along `direction`.
    pub fn directional(direction: Vec3, color: Vec3) -> Self {
        Self {
            kind: LightKind::Directional { direction },
            color,
            attenuation: Attenuation::NONE,
        }
    }

    /// Decode the packed `xyz` + `w` discriminator convention.
    ///
    /// `w == 1.0` selects a point light; any other value selects a directional
    /// light. The discriminator is only compared, never divided by.
    pub fn from_vector(vector: Vec4, color: Vec3, attenuation: Attenuation) -> Self {
        let xyz = vector.truncate();
        if vector.w == 1.0 {
            Self::point(xyz, color, attenuation)
        } else {
            Self {
                kind: LightKind::Directional { direction: xyz },
                color,
                attenuation,
            }
        }
    }

    /// Encode as `xyz` + `w` discriminator.
    pub fn to_vector(&self) -> Vec4 {
        match self.kind {
            LightKind::Point { position } => position.extend(1.0),
            LightKind::Directional { direction } => direction.extend(0.0),
        }
    }

    /// Build from the configured scene light.
    pub fn from_config(config: &LightConfig) -> Self {
        let vector = Vec3::from_array(config.vector);
        let color = Vec3::from_array(config.color);
        let attenuation = Attenuation::from_array(config.attenuation);
        match config.kind {
            LightKindConfig::Point => Self::point(vector, color, attenuation),
            LightKindConfig::Directional => Self {
                kind: LightKind::Directional { direction: vector },
                color,
                attenuation,
            },
        }
    }

    /// Returns `true` for point lights.
    pub fn is_point(&self) -> bool {
        matches!(self.kind, LightKind::Point { .. })
    }

    /// Unit vector from `position` toward the light.
    ///
    /// Zero when the direction is degenerate (fragment at the light position,
    /// or a zero directional vector).
    pub fn direction_from(&self, position: Vec3) -> Vec3 {
        match self.kind {
            LightKind::Point { position: light_pos } => (light_pos - position).normalize_or_zero(),
            LightKind::Directional { direction } => (-direction).normalize_or_zero(),
        }
    }

    /// Distance falloff at `position`: always 1 for directional lights.
    pub fn attenuation_at(&self, position: Vec3) -> f32 {
        match self.kind {
            LightKind::Point { position: light_pos } => {
                self.attenuation.factor(light_pos.distance(position))
            }
            LightKind::Directional { .. } => 1.0,
        }
    }

    /// Build the GPU-side uniform.
    pub fn to_uniform(&self) -> LightUniform {
        let [a0, a1, a2] = self.attenuation.to_array();
        LightUniform {
            vector: self.to_vector().to_array(),
            color_pad: self.color.extend(0.0).to_array(),
            attenuation_pad: [a0, a1, a2, 0.0],
        }
    }

    /// Decode a GPU-side uniform.
    pub fn from_uniform(uniform: &LightUniform) -> Self {
        let [a0, a1, a2, _] = uniform.attenuation_pad;
        Self::from_vector(
            Vec4::from_array(uniform.vector),
            Vec4::from_array(uniform.color_pad).truncate(),
            Attenuation::from_array([a0, a1, a2]),
        )
    }
}

/// GPU-side light block, 48 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    /// xyz = position or travel direction, w = 1 (point) or 0 (directional).
    pub vector: [f32; 4],
    /// xyz = color (linear RGB), w = padding.
    pub color_pad: [f32; 4],
    /// xyz = constant, linear, quadratic attenuation, w = padding.
    pub attenuation_pad: [f32; 4],
}
