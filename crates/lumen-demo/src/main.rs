//! Renders the demo scene with the Lumen forward shading core and writes a PNG.

mod error;
mod render;
mod scene;
mod shadow_pass;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use lumen_config::{CliArgs, Config};
use lumen_shading::{Light, PostChain};
use tracing::{error, info};

use crate::error::DemoError;
use crate::render::FrameInputs;
use crate::scene::Scene;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let (config_dir, config) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            lumen_log::init_logging(None, false, None);
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = config_dir.join("logs");
    lumen_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve the config directory, load or create `config.ron`, then apply CLI overrides.
fn load_config(args: &CliArgs) -> Result<(PathBuf, Config), DemoError> {
    let config_dir = match &args.config {
        Some(dir) => dir.clone(),
        None => Config::default_dir()?,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);
    Ok((config_dir, config))
}

fn run(config: &Config) -> Result<(), DemoError> {
    let started = Instant::now();
    let (width, height) = (config.render.width, config.render.height);
    if width == 0 || height == 0 {
        return Err(DemoError::EmptyFrame { width, height });
    }

    let scene = Scene::demo(width as f32 / height as f32)?;
    let light = Light::from_config(&config.light);
    info!(
        point = light.is_point(),
        vector = ?light.to_vector(),
        objects = scene.objects.len(),
        "Scene ready"
    );

    let light_view_proj = shadow_pass::light_view_projection(&light, &scene);
    let shadow_map =
        shadow_pass::render_shadow_map(&scene, &light_view_proj, config.shadow.resolution)?;
    info!(
        "Shadow map {}x{} rendered in {:.1?}",
        shadow_map.width(),
        shadow_map.height(),
        started.elapsed()
    );

    let post = PostChain::from_config(&config.post);
    let inputs = FrameInputs {
        config,
        light: &light,
        light_view_proj,
        shadow_map: &shadow_map,
        post: &post,
    };
    let frame = render::render(&scene, width, height, &inputs);
    info!(
        color_mode = config.shading.color_mode,
        post = ?post.step_names(),
        "Shaded {width}x{height} frame in {:.1?}",
        started.elapsed()
    );

    frame.to_image().save(&config.render.output)?;
    info!("Wrote {}", config.render.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.render.width = 32;
        config.render.height = 24;
        config.shadow.resolution = 64;
        config.render.output = dir.path().join("frame.png");

        run(&config).unwrap();

        let image = image::open(&config.render.output).unwrap();
        assert_eq!((image.width(), image.height()), (32, 24));
    }

    #[test]
    fn test_load_config_creates_default_and_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs {
            width: Some(100),
            config: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let (config_dir, config) = load_config(&args).unwrap();
        assert_eq!(config_dir, dir.path());
        assert!(dir.path().join("config.ron").exists());
        assert_eq!(config.render.width, 100);
    }

    #[test]
    fn test_load_config_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "(render: (width: \"wide\"))").unwrap();
        let args = CliArgs {
            config: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(load_config(&args), Err(DemoError::Config(_))));
    }

    #[test]
    fn test_run_rejects_empty_frame() {
        let mut config = Config::default();
        config.render.height = 0;
        assert!(matches!(
            run(&config),
            Err(DemoError::EmptyFrame { height: 0, .. })
        ));
    }

    #[test]
    fn test_run_reports_bad_shadow_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.render.width = 8;
        config.render.height = 8;
        config.shadow.resolution = 0;
        config.render.output = dir.path().join("never.png");
        assert!(matches!(run(&config), Err(DemoError::ShadowMap(_))));
    }
}
