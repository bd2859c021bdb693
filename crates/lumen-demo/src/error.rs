//! Errors surfaced by the demo binary.

use lumen_config::ConfigError;
use lumen_shading::{ShadowMapError, TextureError};

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Config directory could not be resolved or `config.ron` could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A scene texture could not be built.
    #[error("texture error: {0}")]
    Texture(#[from] TextureError),

    /// The shadow pass produced an invalid map.
    #[error("shadow map error: {0}")]
    ShadowMap(#[from] ShadowMapError),

    /// The PNG could not be encoded or written.
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    /// Output width or height is zero.
    #[error("output size {width}x{height} has no pixels")]
    EmptyFrame { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DemoError::EmptyFrame {
            width: 0,
            height: 480,
        };
        assert_eq!(err.to_string(), "output size 0x480 has no pixels");

        let err = DemoError::from(ShadowMapError::ZeroSize {
            width: 0,
            height: 0,
        });
        assert!(err.to_string().starts_with("shadow map error"));
    }
}
