//! sonance-engine: render path for Sonance
//!
//! Pulls audio from a [`SampleSource`], runs it through an ordered chain of
//! STFT effects and an optional output clamp.

pub mod playback;
pub mod source;

pub use playback::Playback;
pub use source::{BufferSource, SampleSource, TestTone};
