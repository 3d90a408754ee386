//! Contracts for the low-level renderer: device enumeration, sessions that
//! sample, and the scene they sample from.

use serde::{Deserialize, Serialize};

use prism_core::{MeshIdentity, MeshIdentityLookup, ObjectInstanceId, ShaderHash};
use prism_shader::ShaderDescription;

use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    Cpu,
    Cuda,
    Optix,
    OpenCl,
    Metal,
}

/// A render device as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub kind: DeviceKind,
    /// Whether the driver can share buffers with the host's GL context.
    pub supports_gl_interop: bool,
}

impl DeviceInfo {
    pub fn new(index: usize, name: &str, kind: DeviceKind) -> Self {
        Self {
            index,
            name: name.to_string(),
            kind,
            supports_gl_interop: false,
        }
    }

    pub fn with_gl_interop(mut self, supported: bool) -> Self {
        self.supports_gl_interop = supported;
        self
    }

    pub fn is_cpu(&self) -> bool {
        self.kind == DeviceKind::Cpu
    }
}

/// How finished passes reach the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayPath {
    /// The session draws directly into the host's GL context.
    OpenGlInterop,
    /// The session renders into a buffer the host copies from.
    OffscreenBuffer,
}

/// Everything needed to create a renderer session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub device: DeviceInfo,
    /// Render resolution, already divided by `pixel_size`.
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub tile_size: u32,
    pub threads: u32,
    pub pixel_size: u32,
    pub display: DisplayPath,
}

/// The renderer library itself.
pub trait RenderBackend: Send + Sync {
    /// One-time library and device initialisation. Called at most once per
    /// successful initialisation; see [`crate::BackendHandle`].
    fn initialize(&self) -> Result<(), RenderError>;

    fn devices(&self) -> Vec<DeviceInfo>;

    fn create_session(&self, params: &SessionParams) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// A live renderer session. Owned by the render thread only.
pub trait RenderSession: Send {
    /// Resize and restart progressive accumulation.
    fn reset(&mut self, width: u32, height: u32, samples: u32);

    fn set_samples(&mut self, samples: u32);

    /// Take one progressive sample. Returns `false` when the pass was aborted.
    fn sample(&mut self) -> bool;

    /// Abort the pass in flight so the scene can be mutated safely.
    fn cancel(&mut self);

    /// Push integrator settings (bounces, shadows, ...) to the renderer.
    fn sync_integrator(&mut self);

    /// Release renderer resources. The session is dropped afterwards.
    fn end(&mut self);

    fn scene(&mut self) -> &mut dyn RenderScene;
}

/// The renderer-side scene a session samples.
pub trait RenderScene: Send {
    fn add_shader(&mut self, shader: ShaderHash, description: &ShaderDescription);

    fn upload_mesh(&mut self, mesh: MeshIdentity, instance: ObjectInstanceId, shader: ShaderHash);

    /// Point an existing instance at another shader without touching its geometry.
    fn assign_shader(&mut self, instance: ObjectInstanceId, shader: ShaderHash);

    fn remove_instance(&mut self, instance: ObjectInstanceId);

    fn mesh_for_instance(&self, instance: ObjectInstanceId) -> Option<MeshIdentity>;

    /// Re-evaluate scene data after mutation.
    fn reset(&mut self);
}

/// Resolves instance geometry through the renderer scene.
pub(crate) struct SceneLookup<'a>(pub &'a dyn RenderScene);

impl MeshIdentityLookup for SceneLookup<'_> {
    fn mesh_identity_for_instance(&self, instance: ObjectInstanceId) -> Option<MeshIdentity> {
        self.0.mesh_for_instance(instance)
    }
}
