//! Texture storage, sampling, and loading.
//!
//! Textures are decoded from disk into linear float RGBA and sampled with
//! bilinear filtering. Bump maps additionally expose the local slope of the
//! texture intensity, which the integrator uses to tilt shading normals.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use glint_math::{Vec2, Vec3};
use thiserror::Error;

use crate::material::Color;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decoding error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixels in linear RGBA float format.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// `[R, G, B, A]` per pixel, row-major order, linear 0-1 range.
    pub pixels: Vec<[f32; 4]>,
    /// Original file path (for diagnostics).
    pub path: String,
}

impl Texture {
    /// Create a texture from raw pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Create a 1x1 solid color texture.
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
            path: "<solid>".to_string(),
        }
    }

    /// Sample the texture at UV coordinates with bilinear filtering.
    ///
    /// UVs wrap; (0, 0) is the bottom-left corner.
    pub fn sample(&self, uv: Vec2) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }

        // Wrap into [0, 1) and flip V: texel row 0 is the top of the image.
        let wrapped = uv - uv.floor();
        let grid = Vec2::new(
            wrapped.x * (self.width as f32 - 1.0),
            (1.0 - wrapped.y) * (self.height as f32 - 1.0),
        );
        let cell = grid.floor();
        let frac = grid - cell;

        // Blend the 2x2 texel neighborhood, weighting each corner by the
        // area of the opposite sub-rectangle.
        let mut blended = Color::ZERO;
        for corner in 0..4u32 {
            let dx = corner & 1;
            let dy = corner >> 1;
            let wx = if dx == 0 { 1.0 - frac.x } else { frac.x };
            let wy = if dy == 0 { 1.0 - frac.y } else { frac.y };
            blended += self.texel(cell.x as u32 + dx, cell.y as u32 + dy) * (wx * wy);
        }
        blended
    }

    /// Intensity slope towards +U, one texel wide. Used for bump mapping.
    pub fn slope_right(&self, uv: Vec2) -> f32 {
        let du = 1.0 / self.width.max(1) as f32;
        self.intensity(uv + Vec2::new(du, 0.0)) - self.intensity(uv)
    }

    /// Intensity slope towards -V, one texel tall. Used for bump mapping.
    pub fn slope_down(&self, uv: Vec2) -> f32 {
        let dv = 1.0 / self.height.max(1) as f32;
        self.intensity(uv - Vec2::new(0.0, dv)) - self.intensity(uv)
    }

    /// Mean of the RGB channels at the sampled point.
    fn intensity(&self, uv: Vec2) -> f32 {
        let c = self.sample(uv);
        (c.x + c.y + c.z) / 3.0
    }

    /// RGB of one texel, with coordinates clamped to the image border.
    fn texel(&self, x: u32, y: u32) -> Color {
        let row = y.min(self.height - 1);
        let col = x.min(self.width - 1);
        match self.pixels.get((row * self.width + col) as usize) {
            Some([r, g, b, _]) => Color::new(*r, *g, *b),
            None => Color::ZERO,
        }
    }
}

/// Cache for textures loaded from disk.
///
/// Populated before rendering begins; read-only during rendering.
pub struct TextureCache {
    textures: HashMap<String, Arc<Texture>>,
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache resolving relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, reusing the cached copy if present.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let texture = Arc::new(load_texture_file(&full_path)?);
        self.textures.insert(path.to_string(), texture.clone());

        log::debug!(
            "loaded texture {} ({}x{})",
            path,
            texture.width,
            texture.height
        );

        Ok(texture)
    }

    /// Get a cached texture without loading.
    pub fn get(&self, path: &str) -> Option<Arc<Texture>> {
        self.textures.get(path).cloned()
    }

    /// Number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// True if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode a texture file (PNG, JPEG, ...) into linear float RGBA.
fn load_texture_file(path: &Path) -> TextureResult<Texture> {
    let img = image::open(path)
        .map_err(|e| TextureError::LoadError(format!("failed to open {}: {}", path.display(), e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let curve = srgb_curve();

    let mut pixels = Vec::with_capacity((width * height) as usize);
    for texel in rgba.pixels() {
        let [r, g, b, a] = texel.0;
        pixels.push([
            curve[r as usize],
            curve[g as usize],
            curve[b as usize],
            f32::from(a) / 255.0,
        ]);
    }

    Ok(Texture::new(
        width,
        height,
        pixels,
        path.to_string_lossy().to_string(),
    ))
}

/// Decode curve from 8-bit sRGB to linear, tabulated once per process.
fn srgb_curve() -> &'static [f32; 256] {
    static CURVE: OnceLock<[f32; 256]> = OnceLock::new();
    CURVE.get_or_init(|| {
        let mut table = [0.0f32; 256];
        for (byte, slot) in table.iter_mut().enumerate() {
            let encoded = byte as f32 / 255.0;
            *slot = if encoded > 0.04045 {
                ((encoded + 0.055) / 1.055).powf(2.4)
            } else {
                encoded / 12.92
            };
        }
        table
    })
}

/// Convert one sRGB byte to linear via the tabulated curve.
fn srgb_to_linear(value: u8) -> f32 {
    srgb_curve()[value as usize]
}
