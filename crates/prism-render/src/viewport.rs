//! Viewport render engine: the session policy for interactive viewports and
//! the handle that owns the render thread.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use prism_core::ObjectShaderIndex;
use prism_shader::TextureExtractor;

use crate::backend::{DeviceInfo, DisplayPath, SessionParams};
use crate::change_queue::ChangeQueue;
use crate::config::{DeviceSelection, EngineConfig};
use crate::error::RenderError;
use crate::events::RenderEvent;
use crate::init::BackendHandle;
use crate::session::{RenderEngine, SessionPolicy};
use crate::signals::EngineSignals;

/// Resolve a device selection against the backend's device list.
pub fn select_device(devices: &[DeviceInfo], selection: DeviceSelection) -> Result<DeviceInfo, RenderError> {
    let first = devices.first().ok_or(RenderError::NoDevices)?;
    match selection {
        DeviceSelection::Default => Ok(first.clone()),
        DeviceSelection::Index(index) => devices
            .iter()
            .find(|d| d.index == index)
            .cloned()
            .ok_or(RenderError::DeviceNotFound {
                index,
                available: devices.len(),
            }),
    }
}

/// GL interop is used only for GPU devices that support it, and only when
/// the host prefers it.
pub fn display_path(device: &DeviceInfo, prefer_gl_interop: bool) -> DisplayPath {
    if prefer_gl_interop && !device.is_cpu() && device.supports_gl_interop {
        DisplayPath::OpenGlInterop
    } else {
        DisplayPath::OffscreenBuffer
    }
}

/// Session policy for interactive viewports.
pub struct ViewportPolicy {
    config: EngineConfig,
}

impl ViewportPolicy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl SessionPolicy for ViewportPolicy {
    fn session_params(
        &self,
        devices: &[DeviceInfo],
        selection: DeviceSelection,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<SessionParams, RenderError> {
        let device = select_device(devices, selection)?;
        let pixel_size = self.config.pixel_size();
        Ok(SessionParams {
            tile_size: self.config.tile_size_for(&device),
            threads: if device.is_cpu() { self.config.threads } else { 0 },
            display: display_path(&device, self.config.prefer_gl_interop),
            width: (width / pixel_size).max(1),
            height: (height / pixel_size).max(1),
            samples,
            pixel_size,
            device,
        })
    }
}

/// Owns a [`RenderEngine`] and the thread it runs on.
///
/// Every method is callable from any host thread; they only set flags the
/// render loop picks up on its next iteration. Dropping the handle cancels
/// the loop and waits for it to finish.
pub struct ViewportRenderEngine {
    engine: Option<RenderEngine>,
    signals: Arc<EngineSignals>,
    index: Arc<RwLock<ObjectShaderIndex>>,
    events: Receiver<RenderEvent>,
    thread: Option<JoinHandle<()>>,
}

impl ViewportRenderEngine {
    pub fn new(
        backend: Arc<BackendHandle>,
        queue: Box<dyn ChangeQueue>,
        textures: Box<dyn TextureExtractor + Send>,
        config: EngineConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let policy = Box::new(ViewportPolicy::new(config.clone()));
        let (engine, events) = RenderEngine::new(backend, policy, queue, textures, config, width, height);
        Self {
            signals: engine.signals(),
            index: engine.shader_index(),
            engine: Some(engine),
            events,
            thread: None,
        }
    }

    /// Spawn the render thread. Can only be done once.
    pub fn start(&mut self) -> Result<(), RenderError> {
        let mut engine = self.engine.take().ok_or(RenderError::AlreadyStarted)?;
        let handle = thread::Builder::new()
            .name("prism-render".to_string())
            .spawn(move || engine.run())?;
        self.thread = Some(handle);
        Ok(())
    }

    pub fn events(&self) -> &Receiver<RenderEvent> {
        &self.events
    }

    pub fn signals(&self) -> Arc<EngineSignals> {
        Arc::clone(&self.signals)
    }

    pub fn shader_index(&self) -> Arc<RwLock<ObjectShaderIndex>> {
        Arc::clone(&self.index)
    }

    /// The viewport was resized; accumulation restarts at the new size.
    pub fn set_render_size(&self, width: u32, height: u32) {
        self.signals.set_render_size(width, height);
        self.signals.request_reset();
    }

    pub fn change_sample_target(&self, samples: u32) {
        self.signals.set_sample_target(samples);
    }

    pub fn request_reset(&self) {
        self.signals.request_reset();
    }

    /// Display-only settings changed; see [`crate::DisplayResetPolicy`].
    pub fn request_display_reset(&self) {
        self.signals.request_display_reset();
    }

    /// Ask the loop to synchronize even if the change queue looks empty.
    pub fn notify_changes(&self) {
        self.signals.request_flush();
    }

    /// Switch render device. The session is recreated with an empty scene,
    /// so the host must queue its scene again after
    /// [`RenderEvent::SessionRecreated`].
    pub fn change_device(&self, selection: DeviceSelection) {
        self.signals.request_device(selection);
    }

    /// Freeze the scene: pending changes stay queued until [`Self::unlock`].
    pub fn lock(&self) {
        self.signals.set_locked(true);
    }

    pub fn unlock(&self) {
        self.signals.set_locked(false);
    }

    pub fn is_locked(&self) -> bool {
        self.signals.is_locked()
    }

    pub fn cancel(&self) {
        self.signals.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait for the render thread to exit. Does not cancel it.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Render thread panicked");
            }
        }
    }
}

impl Drop for ViewportRenderEngine {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DeviceKind;
    use crate::change_queue::{ChannelChangeQueue, SceneChange};
    use crate::session::RenderState;
    use crate::testing::{init_logging, StubBackend, StubTextures};
    use prism_core::{MeshIdentity, ObjectInstanceId, ShaderHash};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use uuid::Uuid;

    const WAIT: Duration = Duration::from_secs(5);

    fn devices() -> Vec<DeviceInfo> {
        vec![
            DeviceInfo::new(0, "CPU", DeviceKind::Cpu),
            DeviceInfo::new(1, "GPU", DeviceKind::Cuda).with_gl_interop(true),
            DeviceInfo::new(2, "Old GPU", DeviceKind::OpenCl),
        ]
    }

    fn wait_for(events: &Receiver<RenderEvent>, wanted: impl Fn(&RenderEvent) -> bool) -> bool {
        let deadline = std::time::Instant::now() + WAIT;
        while let Some(left) = deadline.checked_duration_since(std::time::Instant::now()) {
            match events.recv_timeout(left) {
                Ok(event) if wanted(&event) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
        false
    }

    #[test]
    fn test_select_device() {
        let devices = devices();
        assert_eq!(select_device(&devices, DeviceSelection::Default).unwrap().name, "CPU");
        assert_eq!(select_device(&devices, DeviceSelection::Index(2)).unwrap().name, "Old GPU");
        assert!(matches!(
            select_device(&devices, DeviceSelection::Index(9)),
            Err(RenderError::DeviceNotFound { index: 9, available: 3 })
        ));
        assert!(matches!(select_device(&[], DeviceSelection::Default), Err(RenderError::NoDevices)));
    }

    #[test]
    fn test_display_path() {
        let devices = devices();
        assert_eq!(display_path(&devices[0], true), DisplayPath::OffscreenBuffer);
        assert_eq!(display_path(&devices[1], true), DisplayPath::OpenGlInterop);
        assert_eq!(display_path(&devices[1], false), DisplayPath::OffscreenBuffer);
        assert_eq!(display_path(&devices[2], true), DisplayPath::OffscreenBuffer);
    }

    #[test]
    fn test_policy_scales_for_high_dpi() {
        let policy = ViewportPolicy::new(EngineConfig {
            dpi_scale: 2.0,
            threads: 4,
            ..Default::default()
        });
        let params = policy
            .session_params(&devices(), DeviceSelection::Default, 1920, 1080, 16)
            .unwrap();
        assert_eq!((params.width, params.height), (960, 540));
        assert_eq!(params.pixel_size, 2);
        assert_eq!(params.tile_size, 32);
        assert_eq!(params.threads, 4);
        assert_eq!(params.samples, 16);

        let gpu = policy
            .session_params(&devices(), DeviceSelection::Index(1), 1920, 1080, 16)
            .unwrap();
        assert_eq!(gpu.tile_size, 128);
        assert_eq!(gpu.threads, 0);
        assert_eq!(gpu.display, DisplayPath::OpenGlInterop);
    }

    #[test]
    fn test_start_runs_and_drop_stops() {
        init_logging();
        let backend = Arc::new(StubBackend::new());
        let (queue, sender) = ChannelChangeQueue::new();
        let config = EngineConfig {
            samples: 1_000_000,
            throttle_ms: 1,
            ..Default::default()
        };
        let mut viewport = ViewportRenderEngine::new(
            Arc::new(BackendHandle::new(backend.clone())),
            Box::new(queue),
            Box::new(StubTextures),
            config,
            64,
            64,
        );
        viewport.start().unwrap();
        assert!(matches!(viewport.start(), Err(RenderError::AlreadyStarted)));

        assert!(wait_for(viewport.events(), |e| *e == RenderEvent::RenderStarted { success: true }));

        let mesh = MeshIdentity::new(Uuid::new_v4(), 0);
        sender.push(SceneChange::MeshAdded {
            mesh,
            instance: ObjectInstanceId(4),
            shader: ShaderHash(2),
        });
        assert!(wait_for(viewport.events(), |e| *e == RenderEvent::SynchronizeEnd));
        assert_eq!(
            viewport.shader_index().read().unwrap().lookup_shader_for_mesh(&mesh),
            ShaderHash(2)
        );

        let events = viewport.events().clone();
        drop(viewport);
        assert!(events
            .try_iter()
            .any(|e| e == RenderEvent::StateChanged(RenderState::Stopped)));
        assert_eq!(backend.log.take().last().map(String::as_str), Some("end"));
    }

    #[test]
    fn test_lock_holds_changes_until_unlock() {
        init_logging();
        let backend = Arc::new(StubBackend::new());
        let (queue, sender) = ChannelChangeQueue::new();
        let mut viewport = ViewportRenderEngine::new(
            Arc::new(BackendHandle::new(backend.clone())),
            Box::new(queue),
            Box::new(StubTextures),
            EngineConfig {
                throttle_ms: 1,
                ..Default::default()
            },
            64,
            64,
        );
        viewport.start().unwrap();
        assert!(wait_for(viewport.events(), |e| matches!(e, RenderEvent::RenderStarted { .. })));

        let wait_samples = |n: usize| {
            let target = backend.samples.load(Ordering::SeqCst) + n;
            while backend.samples.load(Ordering::SeqCst) < target {
                thread::yield_now();
            }
        };

        viewport.lock();
        assert!(viewport.is_locked());
        wait_samples(2);
        sender.push(SceneChange::IntegratorChanged);
        wait_samples(3);
        assert!(viewport.events().try_iter().all(|e| e != RenderEvent::SynchronizeBegin));

        viewport.unlock();
        assert!(wait_for(viewport.events(), |e| *e == RenderEvent::SynchronizeBegin));

        viewport.cancel();
        viewport.join();
        assert!(!viewport.is_running());
    }

    #[test]
    fn test_failed_start_is_reported() {
        init_logging();
        let backend = Arc::new(StubBackend::new());
        backend.fail_init.store(true, Ordering::SeqCst);
        let (queue, _sender) = ChannelChangeQueue::new();
        let mut viewport = ViewportRenderEngine::new(
            Arc::new(BackendHandle::new(backend)),
            Box::new(queue),
            Box::new(StubTextures),
            EngineConfig::default(),
            64,
            64,
        );
        viewport.start().unwrap();
        assert!(wait_for(viewport.events(), |e| *e == RenderEvent::RenderStarted { success: false }));
        viewport.join();
        assert!(!viewport.is_running());
    }
}
