use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use prism_core::Rgba;

use crate::material::{NativeMaterial, TextureImage};

const EPSILON: f32 = 1e-4;

/// Renderer-native shading model a material is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Picture,
    Plaster,
    Glass,
    Gem,
    Paint,
    Plastic,
    Metal,
    /// No archetype matched; the generic shader graph is built from the
    /// parameters alone.
    Custom,
    /// The material supplied its own renderer-native shader.
    Native,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Picture => "picture",
            Archetype::Plaster => "plaster",
            Archetype::Glass => "glass",
            Archetype::Gem => "gem",
            Archetype::Paint => "paint",
            Archetype::Plastic => "plastic",
            Archetype::Metal => "metal",
            Archetype::Custom => "custom",
            Archetype::Native => "native",
        };
        f.write_str(name)
    }
}

/// One texture slot of a shader body. Absent when no image or zero amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureChannel {
    pub image: Option<TextureImage>,
    /// Blend amount in `[0, 1]`.
    pub amount: f32,
    pub use_alpha: bool,
}

impl TextureChannel {
    pub fn is_active(&self) -> bool {
        self.image.is_some() && self.amount > 0.0
    }
}

/// One half (front or back) of a [`ShaderDescription`].
///
/// Colours are stored as the host reports them; the `*_linear` accessors
/// apply `gamma` so a later gamma change never leaves stale linear values.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderBody {
    pub name: String,
    pub archetype: Archetype,

    pub diffuse: Rgba,
    pub specular: Rgba,
    pub reflection: Rgba,
    pub transmission: Rgba,
    pub emission: Rgba,

    pub roughness: f32,
    pub ior: f32,
    pub fresnel_enabled: bool,
    pub fresnel_ior: f32,
    pub reflectivity: f32,
    pub metallic: f32,
    pub transparency: f32,
    pub shine: f32,
    pub gloss: f32,
    pub shadeless: bool,
    pub alpha_transparency: bool,

    pub diffuse_texture: TextureChannel,
    pub bump_texture: TextureChannel,
    pub transparency_texture: TextureChannel,
    pub environment_texture: TextureChannel,

    pub gamma: f32,
}

impl Default for ShaderBody {
    fn default() -> Self {
        Self {
            name: String::new(),
            archetype: Archetype::Custom,
            diffuse: Rgba::BLACK,
            specular: Rgba::BLACK,
            reflection: Rgba::BLACK,
            transmission: Rgba::BLACK,
            emission: Rgba::BLACK,
            roughness: 0.0,
            ior: 1.0,
            fresnel_enabled: false,
            fresnel_ior: 1.0,
            reflectivity: 0.0,
            metallic: 0.0,
            transparency: 0.0,
            shine: 0.0,
            gloss: 0.0,
            shadeless: false,
            alpha_transparency: false,
            diffuse_texture: TextureChannel::default(),
            bump_texture: TextureChannel::default(),
            transparency_texture: TextureChannel::default(),
            environment_texture: TextureChannel::default(),
            gamma: 1.0,
        }
    }
}

impl ShaderBody {
    // ── Linear colour access ─────────────────────────────────────────

    pub fn diffuse_linear(&self) -> Rgba {
        self.diffuse.linearized(self.gamma)
    }

    pub fn specular_linear(&self) -> Rgba {
        self.specular.linearized(self.gamma)
    }

    pub fn reflection_linear(&self) -> Rgba {
        self.reflection.linearized(self.gamma)
    }

    pub fn transmission_linear(&self) -> Rgba {
        self.transmission.linearized(self.gamma)
    }

    pub fn emission_linear(&self) -> Rgba {
        self.emission.linearized(self.gamma)
    }

    // ── Primitive flags ──────────────────────────────────────────────

    pub fn has_diffuse_texture(&self) -> bool {
        self.diffuse_texture.is_active()
    }

    pub fn has_bump_texture(&self) -> bool {
        self.bump_texture.is_active()
    }

    pub fn has_transparency_texture(&self) -> bool {
        self.transparency_texture.is_active()
    }

    pub fn has_environment_texture(&self) -> bool {
        self.environment_texture.is_active()
    }

    pub fn has_emission(&self) -> bool {
        !self.emission.is_black(EPSILON)
    }

    pub fn has_transparency(&self) -> bool {
        self.transparency > EPSILON
    }

    pub fn has_reflectivity(&self) -> bool {
        self.reflectivity > EPSILON
    }

    /// Nothing but plain lit surface colour: no emission, no shadeless
    /// display, no transparency, no reflection.
    fn plain_surface(&self) -> bool {
        !self.has_emission() && !self.shadeless && !self.has_transparency() && !self.has_reflectivity()
    }

    /// Not see-through in any way and not self-lit.
    pub fn is_opaque_lit(&self) -> bool {
        !self.has_transparency()
            && !self.has_transparency_texture()
            && !self.has_emission()
            && !self.shadeless
    }

    // ── Composite predicates ─────────────────────────────────────────

    /// Only a diffuse contribution, optionally textured.
    pub fn diffuse_only(&self) -> bool {
        self.plain_surface()
            && !self.has_bump_texture()
            && !self.has_transparency_texture()
            && !self.has_environment_texture()
    }

    /// Diffuse plus a bump map and nothing else.
    pub fn diffuse_and_bump_only(&self) -> bool {
        self.plain_surface()
            && self.has_bump_texture()
            && !self.has_transparency_texture()
            && !self.has_environment_texture()
    }

    /// Reflective, opaque, untextured apart from an optional environment.
    pub fn reflection_only(&self) -> bool {
        self.has_reflectivity()
            && self.is_opaque_lit()
            && !self.has_diffuse_texture()
            && !self.has_bump_texture()
    }

    /// Transparent with no reflection or emission and no textures.
    pub fn transparency_only(&self) -> bool {
        self.has_transparency()
            && !self.has_reflectivity()
            && !self.has_emission()
            && !self.shadeless
            && !self.has_diffuse_texture()
            && !self.has_bump_texture()
            && !self.has_transparency_texture()
            && !self.has_environment_texture()
    }

    /// Emits light and does nothing else.
    pub fn emission_only(&self) -> bool {
        self.has_emission()
            && !self.has_transparency()
            && !self.has_reflectivity()
            && !self.has_diffuse_texture()
            && !self.has_bump_texture()
            && !self.has_transparency_texture()
            && !self.has_environment_texture()
    }
}

/// Translated form of one host material, owned by whoever requested it.
///
/// `front` and `back` are populated independently. Gamma is kept in one
/// place: [`ShaderDescription::set_gamma`] pushes it into both halves and
/// into the embedded native material, if any.
#[derive(Debug)]
pub struct ShaderDescription {
    pub front: ShaderBody,
    pub back: ShaderBody,
    native: Option<Arc<dyn NativeMaterial>>,
    gamma: f32,
}

impl ShaderDescription {
    pub fn new(front: ShaderBody, back: ShaderBody, gamma: f32) -> Self {
        let mut description = Self {
            front,
            back,
            native: None,
            gamma,
        };
        description.set_gamma(gamma);
        description
    }

    /// Description for a material that carries its own shader.
    pub fn native(name: &str, material: Arc<dyn NativeMaterial>, gamma: f32) -> Self {
        let body = ShaderBody {
            name: name.to_string(),
            archetype: Archetype::Native,
            ..Default::default()
        };
        let mut description = Self {
            front: body.clone(),
            back: body,
            native: Some(material),
            gamma,
        };
        description.set_gamma(gamma);
        description
    }

    pub fn name(&self) -> &str {
        &self.front.name
    }

    pub fn archetype(&self) -> Archetype {
        self.front.archetype
    }

    pub fn native_material(&self) -> Option<&Arc<dyn NativeMaterial>> {
        self.native.as_ref()
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma;
        self.front.gamma = gamma;
        self.back.gamma = gamma;
        if let Some(native) = &self.native {
            native.set_gamma(gamma);
        }
    }
}
