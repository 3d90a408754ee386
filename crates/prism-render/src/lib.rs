//! # Prism Render
//!
//! Drives progressive rendering of a live scene inside a host viewport.
//!
//! A dedicated render thread runs the [`RenderEngine`] state machine: it
//! drains scene edits from a [`ChangeQueue`] while `Uploading`, samples while
//! `Rendering`, and winds down cleanly once cancellation is observed. Host
//! threads talk to it only through [`EngineSignals`] flags and receive
//! [`RenderEvent`]s back over a channel.
//!
//! [`ViewportRenderEngine`] adds the viewport policy (device choice, tile
//! size, pixel size, display path, lock) and owns the render thread.

pub mod backend;
pub mod change_queue;
pub mod config;
pub mod error;
pub mod events;
pub mod init;
pub mod session;
pub mod signals;
pub mod viewport;

#[cfg(test)]
mod testing;

pub use backend::{DeviceInfo, DeviceKind, DisplayPath, RenderBackend, RenderScene, RenderSession, SessionParams};
pub use change_queue::{ChangeQueue, ChangeSender, ChannelChangeQueue, SceneChange};
pub use config::{DeviceSelection, DisplayResetPolicy, EngineConfig};
pub use error::RenderError;
pub use events::{RenderEvent, ViewState};
pub use init::BackendHandle;
pub use session::{RenderEngine, RenderState, SessionPolicy};
pub use signals::EngineSignals;
pub use viewport::{ViewportPolicy, ViewportRenderEngine};
