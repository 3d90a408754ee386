use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::backend::DisplayPath;
use crate::session::RenderState;

/// What the host needs to present a finished pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Display size in host pixels.
    pub width: u32,
    pub height: u32,
    /// Host pixels per rendered pixel edge.
    pub pixel_size: u32,
    pub display: DisplayPath,
}

impl ViewState {
    /// Resolution the renderer actually samples at.
    pub fn render_resolution(&self) -> (u32, u32) {
        let pixel = self.pixel_size.max(1);
        ((self.width / pixel).max(1), (self.height / pixel).max(1))
    }
}

/// Notifications delivered to the host, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Rendering went from not-started to started. `success` is false when
    /// the backend or the initial upload failed.
    RenderStarted { success: bool },
    /// A pass finished. `sample` counts up from 1 after every reset.
    PassCompleted { sample: u32, view: ViewState },
    SynchronizeBegin,
    SynchronizeEnd,
    /// The session was torn down and created again (device change). The
    /// renderer scene is empty afterwards.
    SessionRecreated { success: bool },
    StateChanged(RenderState),
}

/// Render-thread side of the event channel.
pub(crate) struct EventSink {
    sender: Sender<RenderEvent>,
    disconnected: bool,
}

impl EventSink {
    pub(crate) fn new(sender: Sender<RenderEvent>) -> Self {
        Self {
            sender,
            disconnected: false,
        }
    }

    pub(crate) fn emit(&mut self, event: RenderEvent) {
        if self.disconnected {
            return;
        }
        log::trace!("Emitting {:?}", event);
        if self.sender.send(event).is_err() {
            log::warn!("Render event receiver dropped; further events are discarded");
            self.disconnected = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_resolution_scales_by_pixel_size() {
        let view = ViewState {
            width: 1920,
            height: 1080,
            pixel_size: 2,
            display: DisplayPath::OffscreenBuffer,
        };
        assert_eq!(view.render_resolution(), (960, 540));
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = EventSink::new(tx);
        sink.emit(RenderEvent::SynchronizeBegin);
        assert_eq!(rx.try_recv().unwrap(), RenderEvent::SynchronizeBegin);
        drop(rx);
        sink.emit(RenderEvent::SynchronizeEnd);
        sink.emit(RenderEvent::SynchronizeEnd);
        assert!(sink.disconnected);
    }
}
