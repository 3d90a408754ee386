use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::DeviceInfo;
use crate::error::RenderError;

/// Tile size used for CPU devices regardless of configuration.
pub const CPU_TILE_SIZE: u32 = 32;

/// Which render device a session should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSelection {
    /// First device the backend reports.
    Default,
    /// Explicit index into the backend's device list.
    Index(usize),
}

/// What a display-only reset (e.g. a shadow toggle) does to accumulated samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayResetPolicy {
    /// Treat it like a full reset: progressive refinement starts over.
    RestartSampling,
    /// Re-sync integrator settings only and keep the samples taken so far.
    KeepSamples,
}

/// Settings read once when a viewport render session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub device: DeviceSelection,
    /// Number of passes after which the loop idles.
    pub samples: u32,
    /// Tile size for non-CPU devices.
    pub tile_size: u32,
    /// Render threads for CPU devices; 0 picks automatically.
    pub threads: u32,
    /// How long the loop sleeps when there is nothing to do.
    pub throttle_ms: u64,
    /// Draw straight into the host's GL context when the device allows it.
    pub prefer_gl_interop: bool,
    pub display_reset: DisplayResetPolicy,
    /// Display scale factor reported by the host (1.0 = 96 DPI).
    pub dpi_scale: f32,
    /// Gamma used to linearize host material colours.
    pub gamma: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device: DeviceSelection::Default,
            samples: 1000,
            tile_size: 128,
            threads: 0,
            throttle_ms: 10,
            prefer_gl_interop: true,
            display_reset: DisplayResetPolicy::RestartSampling,
            dpi_scale: 1.0,
            gamma: 2.2,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn tile_size_for(&self, device: &DeviceInfo) -> u32 {
        if device.is_cpu() {
            CPU_TILE_SIZE
        } else {
            self.tile_size.max(1)
        }
    }

    /// Rendered pixels per displayed pixel edge. High-DPI displays render at
    /// a coarser pixel size to keep interaction responsive.
    pub fn pixel_size(&self) -> u32 {
        if self.dpi_scale.is_finite() && self.dpi_scale > 1.0 {
            self.dpi_scale.round() as u32
        } else {
            1
        }
    }
}
