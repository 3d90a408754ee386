//! The render session state machine.
//!
//! ```text
//!   Waiting ──(idle flush check)──► Rendering ◄──(upload ok)── Uploading
//!      │                               │                         ▲
//!      └────(pending changes)──────────┴──(pending changes)──────┘
//!   any state ──(cancel observed)──► Stopped
//! ```
//!
//! Scene mutation only happens in `Uploading`, sampling only in `Rendering`.
//! Both run on the render thread, so they never overlap. Resets requested
//! by an upload or by the host are applied at the top of the next
//! iteration, never in the middle of a sample.

use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use prism_core::ObjectShaderIndex;
use prism_shader::{ShaderTranslator, TextureExtractor};

use crate::backend::{DeviceInfo, RenderSession, SceneLookup, SessionParams};
use crate::change_queue::{ChangeQueue, SceneChange};
use crate::config::{DeviceSelection, DisplayResetPolicy, EngineConfig};
use crate::error::RenderError;
use crate::events::{EventSink, RenderEvent, ViewState};
use crate::init::BackendHandle;
use crate::signals::EngineSignals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderState {
    /// No session activity yet.
    Waiting,
    /// Scene edits are being applied to the renderer scene.
    Uploading,
    /// The sampling loop is active.
    Rendering,
    /// The loop has exited or is about to; resources may be torn down.
    Stopped,
}

/// Decides session parameters for a device selection and display size.
pub trait SessionPolicy: Send {
    fn session_params(
        &self,
        devices: &[DeviceInfo],
        selection: DeviceSelection,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<SessionParams, RenderError>;
}

/// Owns the renderer session and runs the progressive render loop.
pub struct RenderEngine {
    state: RenderState,
    backend: Arc<BackendHandle>,
    policy: Box<dyn SessionPolicy>,
    session: Option<Box<dyn RenderSession>>,
    params: Option<SessionParams>,
    device: DeviceSelection,
    queue: Box<dyn ChangeQueue>,
    textures: Box<dyn TextureExtractor + Send>,
    index: Arc<RwLock<ObjectShaderIndex>>,
    signals: Arc<EngineSignals>,
    events: EventSink,
    config: EngineConfig,
    sample_target: u32,
    /// Passes completed since the last accumulation reset.
    pass: u32,
    started: bool,
}

impl RenderEngine {
    pub fn new(
        backend: Arc<BackendHandle>,
        policy: Box<dyn SessionPolicy>,
        queue: Box<dyn ChangeQueue>,
        textures: Box<dyn TextureExtractor + Send>,
        config: EngineConfig,
        width: u32,
        height: u32,
    ) -> (Self, Receiver<RenderEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let engine = Self {
            state: RenderState::Waiting,
            backend,
            policy,
            session: None,
            params: None,
            device: config.device,
            queue,
            textures,
            index: Arc::new(RwLock::new(ObjectShaderIndex::new())),
            signals: Arc::new(EngineSignals::new(width, height, config.samples)),
            events: EventSink::new(tx),
            sample_target: config.samples,
            pass: 0,
            started: false,
            config,
        };
        (engine, rx)
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn signals(&self) -> Arc<EngineSignals> {
        Arc::clone(&self.signals)
    }

    /// Shared read access for host-side lookups. Only the render thread writes.
    pub fn shader_index(&self) -> Arc<RwLock<ObjectShaderIndex>> {
        Arc::clone(&self.index)
    }

    pub fn passes(&self) -> u32 {
        self.pass
    }

    pub fn session_params(&self) -> Option<&SessionParams> {
        self.params.as_ref()
    }

    // ── Loop ─────────────────────────────────────────────────────────

    /// Run until cancellation is observed, then tear the session down.
    pub fn run(&mut self) {
        log::info!("Render loop started");
        self.start();
        while self.state != RenderState::Stopped {
            self.step();
        }
        self.shutdown();
        log::info!("Render loop finished after {} passes", self.pass);
    }

    /// Initialize the backend and create the session. Failure is reported
    /// once through [`RenderEvent::RenderStarted`] and stops the engine.
    pub fn start(&mut self) -> bool {
        if self.signals.is_cancelled() {
            self.set_state(RenderState::Stopped);
            return false;
        }
        match self.create_session() {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                self.mark_started(false);
                self.set_state(RenderState::Stopped);
                false
            }
        }
    }

    /// One loop iteration.
    pub fn step(&mut self) -> RenderState {
        if self.signals.is_cancelled() {
            self.set_state(RenderState::Stopped);
            return self.state;
        }

        if let Some(selection) = self.signals.take_device_request() {
            self.recreate_session(selection);
            if self.state == RenderState::Stopped {
                return self.state;
            }
        }

        self.apply_sample_target();
        self.apply_deferred_reset();

        if self.check_flush() {
            return self.state;
        }

        if self.state == RenderState::Rendering && self.pass < self.sample_target {
            self.render_pass();
        } else {
            thread::sleep(self.config.throttle());
        }
        self.state
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn set_state(&mut self, state: RenderState) {
        if self.state == state {
            return;
        }
        log::debug!("Render state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.events.emit(RenderEvent::StateChanged(state));
    }

    fn mark_started(&mut self, success: bool) {
        if !self.started {
            self.started = true;
            self.events.emit(RenderEvent::RenderStarted { success });
        }
    }

    /// Returns `true` if an upload ran (or was cut short by cancellation).
    fn check_flush(&mut self) -> bool {
        // A lock holds back re-synchronization only; queued edits and the
        // flush flag stay untouched until unlock.
        let pending = !self.signals.is_locked()
            && (self.signals.take_flush() || self.queue.has_pending_changes());
        if !pending {
            if self.state == RenderState::Waiting {
                self.set_state(RenderState::Rendering);
                self.mark_started(true);
            }
            return false;
        }
        self.synchronize();
        true
    }

    fn synchronize(&mut self) {
        if self.signals.is_cancelled() {
            self.set_state(RenderState::Stopped);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.cancel();

        self.set_state(RenderState::Uploading);
        self.events.emit(RenderEvent::SynchronizeBegin);
        let changes = self.queue.flush();
        let applied = self.upload(changes);
        self.events.emit(RenderEvent::SynchronizeEnd);
        log::debug!("Uploaded {} scene changes", applied);

        if self.signals.is_cancelled() {
            self.set_state(RenderState::Stopped);
            return;
        }
        self.signals.request_reset();
        self.set_state(RenderState::Rendering);
        self.mark_started(true);
    }

    /// Apply scene edits. A no-op outside `Uploading`.
    fn upload(&mut self, changes: Vec<SceneChange>) -> usize {
        if self.state != RenderState::Uploading {
            log::warn!("Upload attempted in state {:?}; ignored", self.state);
            return 0;
        }
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let scene = session.scene();
        let translator = ShaderTranslator::new(self.textures.as_ref());
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let mut new_size = None;
        let mut applied = 0;

        for change in changes {
            match change {
                SceneChange::ShaderAdded { shader, material } => {
                    match translator.translate(material.as_ref(), self.config.gamma) {
                        Ok(description) => scene.add_shader(shader, &description),
                        Err(e) => {
                            log::warn!("{}; {} not registered", e, shader);
                            continue;
                        }
                    }
                }
                SceneChange::MeshAdded {
                    mesh,
                    instance,
                    shader,
                } => {
                    scene.upload_mesh(mesh, instance, shader);
                    index.bind_initial(shader, mesh, instance);
                }
                SceneChange::MaterialChanged { instance, shader } => {
                    let old = index.lookup_shader_for_instance(instance);
                    scene.assign_shader(instance, shader);
                    index.rebind(old, shader, instance, &SceneLookup(&*scene));
                }
                SceneChange::InstanceRemoved { instance } => {
                    scene.remove_instance(instance);
                    index.unbind_instance(instance);
                }
                SceneChange::ViewChanged { size } => {
                    if size.is_some() {
                        new_size = size;
                    }
                }
                SceneChange::IntegratorChanged => {
                    log::debug!("Integrator settings changed");
                }
            }
            applied += 1;
        }
        drop(index);

        if let Some((width, height)) = new_size {
            self.signals.set_render_size(width, height);
        }
        applied
    }

    fn apply_sample_target(&mut self) {
        let Some(samples) = self.signals.take_sample_target() else {
            return;
        };
        log::debug!("Sample target {} -> {}", self.sample_target, samples);
        self.sample_target = samples;
        if self.signals.reset_pending() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.set_samples(samples);
        }
    }

    fn apply_deferred_reset(&mut self) {
        let full = self.signals.take_reset();
        let display_only = self.signals.take_display_reset();
        if !full && !display_only {
            return;
        }
        let (width, height) = self.signals.render_size();
        let view = self.view_state_for(width, height);
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let restart = full || self.config.display_reset == DisplayResetPolicy::RestartSampling;
        if restart {
            let (render_width, render_height) = view.render_resolution();
            log::debug!("Resetting session to {}x{}", render_width, render_height);
            session.reset(render_width, render_height, self.sample_target);
            session.scene().reset();
            self.pass = 0;
        }
        session.sync_integrator();
    }

    fn render_pass(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.sample() {
            log::trace!("Pass {} aborted", self.pass + 1);
            thread::sleep(self.config.throttle());
            return;
        }
        self.pass += 1;
        let (width, height) = self.signals.render_size();
        let view = self.view_state_for(width, height);
        log::trace!("Pass {} of {}", self.pass, self.sample_target);
        self.events.emit(RenderEvent::PassCompleted {
            sample: self.pass,
            view,
        });
    }

    fn view_state_for(&self, width: u32, height: u32) -> ViewState {
        match &self.params {
            Some(params) => ViewState {
                width,
                height,
                pixel_size: params.pixel_size,
                display: params.display,
            },
            None => ViewState {
                width,
                height,
                pixel_size: self.config.pixel_size(),
                display: crate::backend::DisplayPath::OffscreenBuffer,
            },
        }
    }

    // ── Session lifecycle ────────────────────────────────────────────

    fn create_session(&mut self) -> Result<(), RenderError> {
        self.backend.ensure_initialized()?;
        if self.signals.is_cancelled() {
            return Ok(());
        }
        let devices = self.backend.backend().devices();
        let (width, height) = self.signals.render_size();
        let params =
            self.policy
                .session_params(&devices, self.device, width, height, self.sample_target)?;
        log::info!(
            "Creating session on '{}' ({}x{}, tile {}, {:?})",
            params.device.name,
            params.width,
            params.height,
            params.tile_size,
            params.display
        );
        let session = self.backend.backend().create_session(&params)?;
        self.session = Some(session);
        self.params = Some(params);
        self.pass = 0;
        Ok(())
    }

    fn destroy_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel();
            session.end();
            log::info!("Session ended");
        }
        self.params = None;
    }

    fn recreate_session(&mut self, selection: DeviceSelection) {
        log::info!("Switching render device to {:?}", selection);
        self.destroy_session();
        self.device = selection;
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let success = match self.create_session() {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        };
        self.events.emit(RenderEvent::SessionRecreated { success });
        if success {
            self.set_state(RenderState::Waiting);
        } else {
            self.set_state(RenderState::Stopped);
        }
    }

    fn shutdown(&mut self) {
        self.set_state(RenderState::Stopped);
        self.destroy_session();
    }
}
