//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level shading configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Output image settings.
    pub render: RenderConfig,
    /// Reflectance settings.
    pub shading: ShadingConfig,
    /// Shadow map sampling settings.
    pub shadow: ShadowConfig,
    /// The single scene light.
    pub light: LightConfig,
    /// Optional post-processing steps.
    pub post: PostConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Output image configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Where the rendered PNG is written.
    pub output: PathBuf,
}

/// Blinn-Phong evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadingConfig {
    /// Fraction of the light color applied as flat ambient.
    pub ambient_strength: f32,
    /// Output flat albedo only, bypassing lighting (picking/debug view).
    pub color_mode: bool,
    /// Scale applied to texture coordinates before albedo sampling.
    pub uv_tiling: [f32; 2],
}

/// Shadow lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    /// Shadow map resolution (width = height) produced by the shadow pass.
    pub resolution: u32,
    /// Slope-scaled depth bias factor, multiplied by `1 - dot(N, L)`.
    pub bias_scale: f32,
    /// Lower bound on the depth bias.
    pub min_bias: f32,
}

/// Which kind of light the `vector` field describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LightKindConfig {
    /// `vector` is a world-space position.
    Point,
    /// `vector` is the direction the light travels.
    Directional,
}

/// Scene light configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    /// Point or directional.
    pub kind: LightKindConfig,
    /// Position (point) or travel direction (directional).
    pub vector: [f32; 3],
    /// Linear RGB color, intensity premultiplied.
    pub color: [f32; 3],
    /// Constant, linear and quadratic attenuation (point lights only).
    pub attenuation: [f32; 3],
}

/// Fog falloff model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum FogModeConfig {
    /// Linear ramp between `start` and `end` distances.
    Linear { start: f32, end: f32 },
    /// `1 - exp(-density * distance)`.
    Exponential { density: f32 },
}

/// Post-processing configuration. Every step is off by default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostConfig {
    /// Apply `color^(1/gamma)` to the final color.
    pub gamma_enabled: bool,
    /// Display gamma.
    pub gamma: f32,
    /// Blend toward `fog_color` with view distance.
    pub fog_enabled: bool,
    /// Linear RGB fog color.
    pub fog_color: [f32; 3],
    /// Fog falloff.
    pub fog_mode: FogModeConfig,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            output: PathBuf::from("lumen.png"),
        }
    }
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            ambient_strength: 0.1,
            color_mode: false,
            uv_tiling: [1.0, 1.0],
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            bias_scale: 0.0001,
            min_bias: 0.00001,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            kind: LightKindConfig::Directional,
            vector: [-0.4, -1.0, -0.3],
            color: [1.0, 1.0, 1.0],
            attenuation: [1.0, 0.09, 0.032],
        }
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            gamma_enabled: false,
            gamma: 2.2,
            fog_enabled: false,
            fog_color: [0.5, 0.6, 0.7],
            fog_mode: FogModeConfig::Linear {
                start: 10.0,
                end: 40.0,
            },
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default per-user configuration directory (`<config_dir>/lumen`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("lumen"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(!ron_str.is_empty());
        assert!(ron_str.contains("width: 640"));
        assert!(ron_str.contains("ambient_strength: 0.1"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.light.kind = LightKindConfig::Point;
        config.post.fog_mode = FogModeConfig::Exponential { density: 0.05 };
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_post_steps_disabled_by_default() {
        let post = PostConfig::default();
        assert!(!post.gamma_enabled, "gamma must be opt-in");
        assert!(!post.fog_enabled, "fog must be opt-in");
    }

    #[test]
    fn test_shadow_bias_defaults() {
        let shadow = ShadowConfig::default();
        assert!((shadow.bias_scale - 0.0001).abs() < 1e-9);
        assert!((shadow.min_bias - 0.00001).abs() < 1e-10);
        assert!(shadow.resolution.is_power_of_two());
    }

    #[test]
    fn test_missing_field_uses_default() {
        // Config missing the `post` section entirely
        let ron_str = "(render: (), shading: (), shadow: (), light: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.post, PostConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let ron_str = "(future_setting: true)";
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let ron_str = "(shading: (color_mode: true))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert!(config.shading.color_mode);
        assert!((config.shading.ambient_strength - 0.1).abs() < 1e-6);
        assert_eq!(config.shading.uv_tiling, [1.0, 1.0]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.render.width = 1920;
        config.render.height = 1080;
        config.shadow.resolution = 4096;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.post.gamma_enabled = true;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_some());
        assert!(result.unwrap().post.gamma_enabled);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_ron_comments_preserved() {
        let ron_str = "// This is a comment\n(\n  // Another comment\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
