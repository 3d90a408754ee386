use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a piece of geometry independent of how many renderer
/// instances reference it: the owning document object plus a sub-mesh index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshIdentity {
    /// Document object the mesh was extracted from.
    pub object_id: Uuid,
    /// Index of the sub-mesh within that object.
    pub sub_index: i32,
}

impl MeshIdentity {
    pub fn new(object_id: Uuid, sub_index: i32) -> Self {
        Self {
            object_id,
            sub_index,
        }
    }
}

impl fmt::Display for MeshIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_id, self.sub_index)
    }
}

/// A renderer-side object instance (one instantiation of a mesh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectInstanceId(pub u32);

impl fmt::Display for ObjectInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Identifies a shader registered with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShaderHash(pub u32);

impl ShaderHash {
    /// Reserved value meaning "no shader currently bound".
    pub const NONE: ShaderHash = ShaderHash(u32::MAX);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

impl Default for ShaderHash {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for ShaderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "shader#none")
        } else {
            write!(f, "shader#{}", self.0)
        }
    }
}
