//! sonance-core: Shared types for the Sonance audio engine
//!
//! Sample buffers, audio formats and the error taxonomy used by every
//! other Sonance crate.

mod error;
mod sample;

pub use error::*;
pub use sample::*;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}
