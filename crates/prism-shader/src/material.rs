use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use prism_core::Rgba;

/// Type identity a host material declares for itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Picture,
    Plaster,
    Glass,
    Gem,
    Paint,
    Plastic,
    Metal,
    /// Any other material type, keyed by the host's type name.
    Other(String),
}

/// The four standard texture slots a host material can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelUsage {
    Diffuse,
    Bump,
    Transparency,
    Environment,
}

impl ChannelUsage {
    pub const ALL: [ChannelUsage; 4] = [
        ChannelUsage::Diffuse,
        ChannelUsage::Bump,
        ChannelUsage::Transparency,
        ChannelUsage::Environment,
    ];
}

/// How a material has configured one texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSlot {
    pub enabled: bool,
    /// Blend amount as a percentage. Hosts allow values above 100.
    pub amount_percent: f32,
    /// Treat the texture's alpha channel as an opacity mask (diffuse only).
    pub use_alpha: bool,
}

impl Default for ChannelSlot {
    fn default() -> Self {
        Self {
            enabled: false,
            amount_percent: 100.0,
            use_alpha: false,
        }
    }
}

impl ChannelSlot {
    pub fn enabled(amount_percent: f32) -> Self {
        Self {
            enabled: true,
            amount_percent,
            use_alpha: false,
        }
    }

    pub fn with_alpha(mut self, use_alpha: bool) -> Self {
        self.use_alpha = use_alpha;
        self
    }
}

/// Fixed-function approximation of a host material.
///
/// This is what every host material can be reduced to regardless of how it
/// is authored. Colours are display-referred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedMaterial {
    pub diffuse: Rgba,
    pub specular: Rgba,
    pub reflection: Rgba,
    pub transparent: Rgba,
    pub emission: Rgba,
    /// Highlight size in `[0, 1]`.
    pub shine: f32,
    /// Reflection glossiness in `[0, 1]`; 1 is a perfect mirror.
    pub gloss: f32,
    pub roughness: f32,
    pub reflectivity: f32,
    pub transparency: f32,
    pub ior: f32,
    pub fresnel_enabled: bool,
    pub fresnel_ior: f32,
    /// Lit by nothing; displays the diffuse colour as is.
    pub shadeless: bool,
    pub alpha_transparency: bool,
}

impl Default for SimulatedMaterial {
    fn default() -> Self {
        Self {
            diffuse: Rgba::rgb(0.5, 0.5, 0.5),
            specular: Rgba::WHITE,
            reflection: Rgba::WHITE,
            transparent: Rgba::WHITE,
            emission: Rgba::BLACK,
            shine: 0.0,
            gloss: 0.0,
            roughness: 0.0,
            reflectivity: 0.0,
            transparency: 0.0,
            ior: 1.0,
            fresnel_enabled: false,
            fresnel_ior: 1.56,
            shadeless: false,
            alpha_transparency: false,
        }
    }
}

/// A material that carries its own renderer-native shader and knows how to
/// bake its parameters. Such materials bypass classification entirely.
pub trait NativeMaterial: fmt::Debug + Send + Sync {
    /// Bring the native shader parameters up to date.
    fn bake_parameters(&self);
    /// Receive the gamma of the description that embeds this material.
    fn set_gamma(&self, gamma: f32);
}

/// A material as authored in the host application.
pub trait HostMaterial: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> MaterialKind;

    /// Evaluate into a fixed-function description. `None` when the material
    /// cannot be evaluated at all.
    fn simulate(&self) -> Option<SimulatedMaterial>;

    fn channel(&self, usage: ChannelUsage) -> ChannelSlot;

    fn native(&self) -> Option<Arc<dyn NativeMaterial>> {
        None
    }

    /// Distinct material for back faces, if the host has one.
    fn back_material(&self) -> Option<Arc<dyn HostMaterial>> {
        None
    }
}

/// A texture handed back by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
}

impl TextureImage {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            has_alpha: false,
        }
    }

    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    pub fn is_usable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Pulls the bitmap behind one texture slot out of a host material.
pub trait TextureExtractor {
    fn extract(&self, material: &dyn HostMaterial, usage: ChannelUsage) -> Option<TextureImage>;
}
