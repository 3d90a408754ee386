use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::config::DeviceSelection;

const DEFAULT_DEVICE: usize = usize::MAX;

/// Flags shared between host threads and the render thread.
///
/// Every flag is set and cleared on its own; there is no multi-field record
/// a reader could observe half-written. Setting a flag twice is the same as
/// setting it once.
#[derive(Debug, Default)]
pub struct EngineSignals {
    flush: AtomicBool,
    cancel: AtomicBool,
    locked: AtomicBool,
    reset: AtomicBool,
    display_reset: AtomicBool,
    samples_changed: AtomicBool,
    sample_target: AtomicU32,
    /// `width << 32 | height`, swapped as one value.
    render_size: AtomicU64,
    device_changed: AtomicBool,
    device: AtomicUsize,
}

impl EngineSignals {
    pub fn new(width: u32, height: u32, samples: u32) -> Self {
        let signals = Self::default();
        signals.render_size.store(pack(width, height), Ordering::SeqCst);
        signals.sample_target.store(samples, Ordering::SeqCst);
        signals
    }

    // ── Flush ────────────────────────────────────────────────────────

    pub fn request_flush(&self) {
        self.flush.store(true, Ordering::SeqCst);
    }

    pub fn take_flush(&self) -> bool {
        self.flush.swap(false, Ordering::SeqCst)
    }

    // ── Cancellation ─────────────────────────────────────────────────

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    // ── Lock ─────────────────────────────────────────────────────────

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    // ── Deferred resets ──────────────────────────────────────────────

    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::SeqCst);
    }

    pub fn reset_pending(&self) -> bool {
        self.reset.load(Ordering::SeqCst)
    }

    pub fn take_reset(&self) -> bool {
        self.reset.swap(false, Ordering::SeqCst)
    }

    pub fn request_display_reset(&self) {
        self.display_reset.store(true, Ordering::SeqCst);
    }

    pub fn take_display_reset(&self) -> bool {
        self.display_reset.swap(false, Ordering::SeqCst)
    }

    // ── Samples ──────────────────────────────────────────────────────

    pub fn set_sample_target(&self, samples: u32) {
        self.sample_target.store(samples, Ordering::SeqCst);
        self.samples_changed.store(true, Ordering::SeqCst);
    }

    pub fn sample_target(&self) -> u32 {
        self.sample_target.load(Ordering::SeqCst)
    }

    /// New sample target, if it changed since the last call.
    pub fn take_sample_target(&self) -> Option<u32> {
        if self.samples_changed.swap(false, Ordering::SeqCst) {
            Some(self.sample_target())
        } else {
            None
        }
    }

    // ── Size ─────────────────────────────────────────────────────────

    pub fn set_render_size(&self, width: u32, height: u32) {
        self.render_size.store(pack(width, height), Ordering::SeqCst);
    }

    pub fn render_size(&self) -> (u32, u32) {
        unpack(self.render_size.load(Ordering::SeqCst))
    }

    // ── Device ───────────────────────────────────────────────────────

    pub fn request_device(&self, selection: DeviceSelection) {
        let encoded = match selection {
            DeviceSelection::Default => DEFAULT_DEVICE,
            DeviceSelection::Index(index) => index,
        };
        self.device.store(encoded, Ordering::SeqCst);
        self.device_changed.store(true, Ordering::SeqCst);
    }

    pub fn take_device_request(&self) -> Option<DeviceSelection> {
        if !self.device_changed.swap(false, Ordering::SeqCst) {
            return None;
        }
        match self.device.load(Ordering::SeqCst) {
            DEFAULT_DEVICE => Some(DeviceSelection::Default),
            index => Some(DeviceSelection::Index(index)),
        }
    }
}

fn pack(width: u32, height: u32) -> u64 {
    ((width as u64) << 32) | height as u64
}

fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, packed as u32)
}
