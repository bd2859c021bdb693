//! Optional color transforms applied after composition.
//!
//! Each step is a [`PostProcess`] strategy; a [`PostChain`] runs the enabled
//! ones in order. Steps only touch RGB, so opacity survives untouched. The
//! default configuration builds an empty chain.

use std::fmt;

use glam::{Vec3, Vec4};
use lumen_config::{FogModeConfig, PostConfig};

/// Per-fragment data available to post steps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PostContext {
    /// Distance from the camera to the fragment.
    pub view_distance: f32,
}

/// A color transform over the composed fragment color.
pub trait PostProcess: fmt::Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Transform `color`. Implementations must leave alpha unchanged.
    fn apply(&self, color: Vec4, ctx: &PostContext) -> Vec4;
}

/// `color^(1/gamma)` per channel.
pub fn gamma_correct(color: Vec3, gamma: f32) -> Vec3 {
    color.powf(gamma.recip())
}

/// Encode linear color for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GammaCorrection {
    /// Display gamma, typically 2.2.
    pub gamma: f32,
}

impl PostProcess for GammaCorrection {
    fn name(&self) -> &'static str {
        "gamma"
    }

    fn apply(&self, color: Vec4, _ctx: &PostContext) -> Vec4 {
        gamma_correct(color.truncate(), self.gamma).extend(color.w)
    }
}

/// How fog density grows with distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FogMode {
    /// No fog before `start`, full fog after `end`.
    Linear {
        /// Distance where fog begins.
        start: f32,
        /// Distance of full fog.
        end: f32,
    },
    /// `1 - exp(-density * distance)`.
    Exponential {
        /// Extinction coefficient.
        density: f32,
    },
}

impl From<FogModeConfig> for FogMode {
    fn from(config: FogModeConfig) -> Self {
        match config {
            FogModeConfig::Linear { start, end } => Self::Linear { start, end },
            FogModeConfig::Exponential { density } => Self::Exponential { density },
        }
    }
}

impl FogMode {
    /// Fog amount in `[0, 1]` at `distance`.
    pub fn amount(&self, distance: f32) -> f32 {
        let amount = match *self {
            Self::Linear { start, end } => {
                if end <= start {
                    if distance >= start { 1.0 } else { 0.0 }
                } else {
                    (distance - start) / (end - start)
                }
            }
            Self::Exponential { density } => 1.0 - (-density * distance).exp(),
        };
        amount.clamp(0.0, 1.0)
    }
}

/// Blend toward a fog color with view distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    /// Linear RGB fog color.
    pub color: Vec3,
    /// Falloff model.
    pub mode: FogMode,
}

impl PostProcess for Fog {
    fn name(&self) -> &'static str {
        "fog"
    }

    fn apply(&self, color: Vec4, ctx: &PostContext) -> Vec4 {
        let t = self.mode.amount(ctx.view_distance);
        color.truncate().lerp(self.color, t).extend(color.w)
    }
}

/// Ordered list of enabled post steps.
#[derive(Debug, Default)]
pub struct PostChain {
    steps: Vec<Box<dyn PostProcess>>,
}

impl PostChain {
    /// An empty chain (identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration: fog first, then gamma so that encoding is last.
    pub fn from_config(config: &PostConfig) -> Self {
        let mut chain = Self::new();
        if config.fog_enabled {
            chain.push(Fog {
                color: Vec3::from_array(config.fog_color),
                mode: config.fog_mode.into(),
            });
        }
        if config.gamma_enabled {
            chain.push(GammaCorrection {
                gamma: config.gamma,
            });
        }
        tracing::debug!(steps = ?chain.step_names(), "post chain configured");
        chain
    }

    /// Append a step.
    pub fn push(&mut self, step: impl PostProcess + 'static) {
        self.steps.push(Box::new(step));
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no step is enabled.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the enabled steps, in order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step over `color`.
    pub fn apply(&self, color: Vec4, ctx: &PostContext) -> Vec4 {
        self.steps
            .iter()
            .fold(color, |color, step| step.apply(color, ctx))
    }
}
