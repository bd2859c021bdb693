//! Command-line argument parsing for the Lumen renderer.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, LightKindConfig};

/// Lumen command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "lumen", about = "Forward-shading fragment renderer")]
pub struct CliArgs {
    /// Output width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Output PNG path.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Shadow map resolution.
    #[arg(long)]
    pub shadow_resolution: Option<u32>,

    /// Render flat albedo only (debug/picking view).
    #[arg(long)]
    pub color_mode: bool,

    /// Enable gamma correction with the given gamma.
    #[arg(long)]
    pub gamma: Option<f32>,

    /// Enable distance fog.
    #[arg(long)]
    pub fog: bool,

    /// Use a point light at the given position instead of the configured light.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub point_light: Option<Vec<f32>>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.render.width = w;
        }
        if let Some(h) = args.height {
            self.render.height = h;
        }
        if let Some(ref path) = args.output {
            self.render.output = path.clone();
        }
        if let Some(res) = args.shadow_resolution {
            self.shadow.resolution = res;
        }
        if args.color_mode {
            self.shading.color_mode = true;
        }
        if let Some(gamma) = args.gamma {
            self.post.gamma_enabled = true;
            self.post.gamma = gamma;
        }
        if args.fog {
            self.post.fog_enabled = true;
        }
        if let Some(ref pos) = args.point_light
            && let &[x, y, z] = pos.as_slice()
        {
            self.light.kind = LightKindConfig::Point;
            self.light.vector = [x, y, z];
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
