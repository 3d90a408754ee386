//! Recording stand-ins for the renderer and host collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use prism_core::{MeshIdentity, ObjectInstanceId, Rgba, ShaderHash};
use prism_shader::{
    ChannelSlot, ChannelUsage, HostMaterial, MaterialKind, ShaderDescription, SimulatedMaterial,
    TextureExtractor, TextureImage,
};

use crate::backend::{DeviceInfo, DeviceKind, RenderBackend, RenderScene, RenderSession, SessionParams};
use crate::error::RenderError;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Ordered record of renderer calls, shared by a backend and its sessions.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

/// A CPU device at index 0 and a GL-capable GPU at index 1.
pub struct StubBackend {
    pub log: CallLog,
    pub init_calls: AtomicUsize,
    pub fail_init: AtomicBool,
    pub samples: Arc<AtomicUsize>,
    /// When set, every pass reports itself aborted.
    pub abort_passes: Arc<AtomicBool>,
    pub devices: Vec<DeviceInfo>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            init_calls: AtomicUsize::new(0),
            fail_init: AtomicBool::new(false),
            samples: Arc::new(AtomicUsize::new(0)),
            abort_passes: Arc::new(AtomicBool::new(false)),
            devices: vec![
                DeviceInfo::new(0, "CPU", DeviceKind::Cpu),
                DeviceInfo::new(1, "GPU", DeviceKind::Cuda).with_gl_interop(true),
            ],
        }
    }
}

impl RenderBackend for StubBackend {
    fn initialize(&self) -> Result<(), RenderError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(RenderError::BackendInit("stub failure".to_string()));
        }
        Ok(())
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }

    fn create_session(&self, params: &SessionParams) -> Result<Box<dyn RenderSession>, RenderError> {
        self.log.push(format!("create {}", params.device.name));
        Ok(Box::new(StubSession {
            log: self.log.clone(),
            samples: Arc::clone(&self.samples),
            abort_passes: Arc::clone(&self.abort_passes),
            scene: StubScene {
                log: self.log.clone(),
                meshes: HashMap::new(),
            },
        }))
    }
}

pub struct StubSession {
    log: CallLog,
    samples: Arc<AtomicUsize>,
    abort_passes: Arc<AtomicBool>,
    scene: StubScene,
}

impl RenderSession for StubSession {
    fn reset(&mut self, width: u32, height: u32, samples: u32) {
        self.log.push(format!("reset {}x{} {}", width, height, samples));
    }

    fn set_samples(&mut self, samples: u32) {
        self.log.push(format!("samples {}", samples));
    }

    fn sample(&mut self) -> bool {
        self.log.push("sample".to_string());
        self.samples.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_micros(200));
        !self.abort_passes.load(Ordering::SeqCst)
    }

    fn cancel(&mut self) {
        self.log.push("cancel".to_string());
    }

    fn sync_integrator(&mut self) {
        self.log.push("sync integrator".to_string());
    }

    fn end(&mut self) {
        self.log.push("end".to_string());
    }

    fn scene(&mut self) -> &mut dyn RenderScene {
        &mut self.scene
    }
}

pub struct StubScene {
    log: CallLog,
    meshes: HashMap<ObjectInstanceId, MeshIdentity>,
}

impl RenderScene for StubScene {
    fn add_shader(&mut self, shader: ShaderHash, description: &ShaderDescription) {
        self.log.push(format!("shader {} {}", shader, description.archetype()));
    }

    fn upload_mesh(&mut self, mesh: MeshIdentity, instance: ObjectInstanceId, shader: ShaderHash) {
        self.meshes.insert(instance, mesh);
        self.log.push(format!("upload {} {} {}", mesh, instance, shader));
    }

    fn assign_shader(&mut self, instance: ObjectInstanceId, shader: ShaderHash) {
        self.log.push(format!("assign {} {}", instance, shader));
    }

    fn remove_instance(&mut self, instance: ObjectInstanceId) {
        self.meshes.remove(&instance);
        self.log.push(format!("remove {}", instance));
    }

    fn mesh_for_instance(&self, instance: ObjectInstanceId) -> Option<MeshIdentity> {
        self.meshes.get(&instance).copied()
    }

    fn reset(&mut self) {
        self.log.push("scene reset".to_string());
    }
}

pub struct StubTextures;

impl TextureExtractor for StubTextures {
    fn extract(&self, material: &dyn HostMaterial, usage: ChannelUsage) -> Option<TextureImage> {
        let name = format!("{}-{:?}", material.name(), usage);
        Some(TextureImage::new(&name, 8, 8))
    }
}

pub struct StubMaterial {
    name: String,
    kind: MaterialKind,
    sim: Option<SimulatedMaterial>,
}

impl StubMaterial {
    pub fn plaster(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MaterialKind::Plaster,
            sim: Some(SimulatedMaterial {
                diffuse: Rgba::rgb(0.9, 0.9, 0.9),
                ..Default::default()
            }),
        }
    }

    pub fn broken(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MaterialKind::Other("broken".to_string()),
            sim: None,
        }
    }
}

impl HostMaterial for StubMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MaterialKind {
        self.kind.clone()
    }

    fn simulate(&self) -> Option<SimulatedMaterial> {
        self.sim.clone()
    }

    fn channel(&self, _usage: ChannelUsage) -> ChannelSlot {
        ChannelSlot::default()
    }
}
