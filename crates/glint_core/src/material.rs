//! Materials, lights, and the color aliases used throughout the renderer.

use glint_math::Vec3;

/// Color type alias (RGB values typically 0-1).
pub type Color = Vec3;

/// Radiance type alias (linear, unbounded non-negative RGB).
pub type Radiance = Vec3;

/// Index into the scene's material table.
pub type MaterialId = usize;

/// Index into the scene's texture table.
pub type TextureId = usize;

/// Identifier naming the BRDF a material is shaded with. The renderer maps
/// identifiers to the actual reflectance functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrdfId {
    Phong,
    #[default]
    CookTorrance,
}

/// Surface material.
///
/// Textures are referenced by index into the scene-owned texture table;
/// materials hold no pointers back into the scene.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub diffuse: Color,
    pub specular: Color,
    pub ambient: Color,
    /// Phong exponent.
    pub exponent: f32,
    pub refraction_index: f32,
    /// 0 = opaque, 1 = fully translucent.
    pub translucency: f32,
    pub reflective: bool,
    /// Probability that a ray mirrors off this surface, in [0, 1].
    pub reflection_strength: f32,
    pub diffuse_texture: Option<TextureId>,
    pub specular_texture: Option<TextureId>,
    pub ambient_texture: Option<TextureId>,
    pub bump_texture: Option<TextureId>,
    pub brdf: BrdfId,
}

impl Material {
    /// Create an opaque, non-reflective material with the given diffuse color.
    pub fn new(name: impl Into<String>, diffuse: Color) -> Self {
        Self {
            name: name.into(),
            diffuse,
            specular: Color::ZERO,
            ambient: Color::ZERO,
            exponent: 0.0,
            refraction_index: 1.0,
            translucency: 0.0,
            reflective: false,
            reflection_strength: 0.0,
            diffuse_texture: None,
            specular_texture: None,
            ambient_texture: None,
            bump_texture: None,
            brdf: BrdfId::default(),
        }
    }

    /// Set the specular color and Phong exponent.
    pub fn with_specular(mut self, specular: Color, exponent: f32) -> Self {
        self.specular = specular;
        self.exponent = exponent;
        self
    }

    /// Make the material translucent with the given refraction index.
    pub fn with_translucency(mut self, translucency: f32, refraction_index: f32) -> Self {
        self.translucency = translucency.clamp(0.0, 1.0);
        self.refraction_index = refraction_index;
        self
    }

    /// Make the material reflective with the given mirror probability.
    pub fn with_reflectivity(mut self, strength: f32) -> Self {
        self.reflective = true;
        self.reflection_strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Attach a diffuse texture.
    pub fn with_diffuse_texture(mut self, texture: TextureId) -> Self {
        self.diffuse_texture = Some(texture);
        self
    }

    /// Attach a specular texture.
    pub fn with_specular_texture(mut self, texture: TextureId) -> Self {
        self.specular_texture = Some(texture);
        self
    }

    /// Attach a bump texture.
    pub fn with_bump_texture(mut self, texture: TextureId) -> Self {
        self.bump_texture = Some(texture);
        self
    }

    /// Select the BRDF this material is shaded with.
    pub fn with_brdf(mut self, brdf: BrdfId) -> Self {
        self.brdf = brdf;
        self
    }

    /// True if any texture slot is populated, meaning texture coordinates
    /// must be interpolated at hit points.
    pub fn has_any_texture(&self) -> bool {
        self.diffuse_texture.is_some()
            || self.specular_texture.is_some()
            || self.ambient_texture.is_some()
            || self.bump_texture.is_some()
    }

    /// The largest texture index referenced, if any. Used to validate
    /// materials against the scene's texture table.
    pub fn max_texture_index(&self) -> Option<TextureId> {
        [
            self.diffuse_texture,
            self.specular_texture,
            self.ambient_texture,
            self.bump_texture,
        ]
        .into_iter()
        .flatten()
        .max()
    }
}

/// A point-like area light, sampled uniformly inside a ball of radius `size`.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Radius of the spherical light volume; 0 gives a point light.
    pub size: f32,
}

impl Light {
    pub fn new(position: Vec3, color: Color, intensity: f32, size: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            size,
        }
    }
}
