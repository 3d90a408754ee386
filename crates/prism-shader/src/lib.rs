//! # Prism Shader
//!
//! Turns arbitrary host materials into [`ShaderDescription`]s: a
//! renderer-native archetype plus a normalized, texture-aware parameter set.
//!
//! Classification first trusts the material's declared type and only then
//! falls back to an ordered table of heuristics (see [`classify`]). Anything
//! unrecognized becomes [`Archetype::Custom`]; ambiguity is never an error.

pub mod classify;
pub mod description;
pub mod material;
pub mod translator;

pub use classify::{classify, Rule, RULES};
pub use description::{Archetype, ShaderBody, ShaderDescription, TextureChannel};
pub use material::{
    ChannelSlot, ChannelUsage, HostMaterial, MaterialKind, NativeMaterial, SimulatedMaterial,
    TextureExtractor, TextureImage,
};
pub use translator::{blend_amount, ShaderTranslator, TranslateError};
