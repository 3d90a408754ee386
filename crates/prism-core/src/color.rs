use serde::{Deserialize, Serialize};

/// RGBA colour with float channels in `[0, 1]`, as stored by the host.
///
/// Host colours are display-referred; [`Rgba::linearized`] converts them to
/// linear light using the gamma recorded on the owning shader description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Build from 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Raise the colour channels to `gamma`. Alpha is already linear.
    pub fn linearized(&self, gamma: f32) -> Self {
        if (gamma - 1.0).abs() < f32::EPSILON {
            return *self;
        }
        Self::new(
            self.r.max(0.0).powf(gamma),
            self.g.max(0.0).powf(gamma),
            self.b.max(0.0).powf(gamma),
            self.a,
        )
    }

    /// True when all colour channels are below `epsilon`.
    pub fn is_black(&self, epsilon: f32) -> bool {
        self.r < epsilon && self.g < epsilon && self.b < epsilon
    }
}
