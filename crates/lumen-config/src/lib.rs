//! Configuration system for the Lumen renderer.
//!
//! Provides runtime-configurable shading, shadow, light and post-processing
//! settings that persist to disk as RON files. Supports CLI overrides via clap,
//! hot-reload detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, FogModeConfig, LightConfig, LightKindConfig, PostConfig, RenderConfig,
    ShadingConfig, ShadowConfig,
};
pub use error::ConfigError;
