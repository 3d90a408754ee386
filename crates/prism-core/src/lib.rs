//! # Prism Core
//!
//! Identity value types shared by every Prism crate, gamma-aware colours,
//! and the object/shader relational index that decides which renderer
//! objects must be re-bound when a material changes.
//!
//! Nothing in this crate touches the renderer or the host application.

pub mod color;
pub mod ids;
pub mod shader_index;

pub use color::Rgba;
pub use ids::{MeshIdentity, ObjectInstanceId, ShaderHash};
pub use shader_index::{MeshIdentityLookup, ObjectShaderIndex};
