//! CPU-side RGBA textures and the sampler used to read them.
//!
//! Texel row 0 corresponds to `v = 0`, matching the upload order of image rows.

use std::path::Path;

use glam::{Vec2, Vec4};
use thiserror::Error;

// ---------------------------------------------------------------------------
// TextureError
// ---------------------------------------------------------------------------

/// Errors returned while building or loading a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Raw data does not match `width * height` texels.
    #[error("expected {expected} texel values, got {actual}")]
    DataLength {
        /// Number of values implied by the dimensions.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Failed to open or decode an image file.
    #[error("image load error: {0}")]
    ImageLoad(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// How coordinates outside `[0, 1]` are mapped back onto the texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressMode {
    /// Coordinates are clamped to the border texels.
    #[default]
    ClampToEdge,
    /// Coordinates wrap around (tiling).
    Repeat,
}

/// Texel reconstruction filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear blend of the four nearest texels.
    Linear,
}

/// Sampling state, analogous to a bound GPU sampler object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sampler {
    /// Out-of-range coordinate handling.
    pub address_mode: AddressMode,
    /// Reconstruction filter.
    pub filter: FilterMode,
}

impl Sampler {
    /// Clamp-to-edge, nearest. Used for depth lookups.
    pub const CLAMP_NEAREST: Self = Self {
        address_mode: AddressMode::ClampToEdge,
        filter: FilterMode::Nearest,
    };

    /// Repeat, bilinear. The default for tiled albedo textures.
    pub const REPEAT_LINEAR: Self = Self {
        address_mode: AddressMode::Repeat,
        filter: FilterMode::Linear,
    };

    /// Map a possibly out-of-range texel index into `0..size`.
    pub(crate) fn wrap(self, index: i64, size: u32) -> usize {
        let size = i64::from(size.max(1));
        let wrapped = match self.address_mode {
            AddressMode::ClampToEdge => index.clamp(0, size - 1),
            AddressMode::Repeat => index.rem_euclid(size),
        };
        wrapped as usize
    }

    /// Reduce a continuous texel coordinate into a range whose integer
    /// neighbours address the same texels, so it can be cast without
    /// saturating.
    pub(crate) fn fold(self, coord: f32, size: u32) -> f32 {
        let size = size.max(1) as f32;
        if !coord.is_finite() {
            return 0.0;
        }
        match self.address_mode {
            AddressMode::ClampToEdge => coord.clamp(-1.0, size),
            AddressMode::Repeat => coord.rem_euclid(size),
        }
    }
}

/// Sanitize a texture coordinate: non-finite components sample the origin.
pub(crate) fn finite_uv(uv: Vec2) -> Vec2 {
    Vec2::new(
        if uv.x.is_finite() { uv.x } else { 0.0 },
        if uv.y.is_finite() { uv.y } else { 0.0 },
    )
}

// ---------------------------------------------------------------------------
// Texture2d
// ---------------------------------------------------------------------------

/// Immutable 2D texture with linear RGBA `f32` texels.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture2d {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl Texture2d {
    /// Build a texture from row-major texels.
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec4>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(TextureError::DataLength {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Build a single-color texture.
    pub fn solid(width: u32, height: u32, color: Vec4) -> Result<Self, TextureError> {
        Self::from_texels(width, height, vec![color; width as usize * height as usize])
    }

    /// Build a texture by evaluating `f(x, y)` for every texel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Vec4,
    ) -> Result<Self, TextureError> {
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self::from_texels(width, height, texels)
    }

    /// Build a texture from tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        let texels = data
            .chunks_exact(4)
            .map(|px| Vec4::new(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32) / 255.0)
            .collect();
        Self::from_texels(width, height, texels)
    }

    /// Convert a decoded image.
    pub fn from_image(image: &image::DynamicImage) -> Result<Self, TextureError> {
        let rgba = image.to_rgba8();
        Self::from_rgba8(rgba.width(), rgba.height(), rgba.as_raw())
    }

    /// Load and decode an image file.
    pub fn open(path: &Path) -> Result<Self, TextureError> {
        let image = image::open(path)?;
        let texture = Self::from_image(&image)?;
        tracing::debug!(
            path = %path.display(),
            width = texture.width,
            height = texture.height,
            "loaded texture"
        );
        Ok(texture)
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel at integer coordinates after applying the sampler's address mode.
    pub fn texel(&self, x: i64, y: i64, sampler: Sampler) -> Vec4 {
        let xi = sampler.wrap(x, self.width);
        let yi = sampler.wrap(y, self.height);
        self.texels[yi * self.width as usize + xi]
    }

    /// Sample at normalized coordinates.
    pub fn sample(&self, uv: Vec2, sampler: Sampler) -> Vec4 {
        let uv = finite_uv(uv);
        match sampler.filter {
            FilterMode::Nearest => {
                let x = (uv.x * self.width as f32).floor() as i64;
                let y = (uv.y * self.height as f32).floor() as i64;
                self.texel(x, y, sampler)
            }
            FilterMode::Linear => {
                let px = sampler.fold(uv.x * self.width as f32 - 0.5, self.width);
                let py = sampler.fold(uv.y * self.height as f32 - 0.5, self.height);
                let x0 = px.floor();
                let y0 = py.floor();
                let fx = px - x0;
                let fy = py - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let top = self
                    .texel(x0, y0, sampler)
                    .lerp(self.texel(x0 + 1, y0, sampler), fx);
                let bottom = self
                    .texel(x0, y0 + 1, sampler)
                    .lerp(self.texel(x0 + 1, y0 + 1, sampler), fx);
                top.lerp(bottom, fy)
            }
        }
    }
}
