//! sonance-dsp: STFT effects for Sonance
//!
//! ## Modules
//! - `window` - Analysis/synthesis window shapes (Hann, Gaussian, Welch, ...)
//! - `transform` - Complex FFT wrapper and frequency/bin mapping
//! - `stft` - Streaming overlap-add frame engine
//! - `eq` - Frequency-range spectral editor and the `Equalizer` effect
//! - `filters` - High-pass, band-cut and band-pass built on the equalizer
//! - `distortion` - Threshold clamp
//! - `config` - Serializable STFT settings and presets

pub mod config;
pub mod distortion;
pub mod eq;
pub mod filters;
pub mod stft;
pub mod transform;
pub mod window;

pub use config::{EqualizerPreset, StftConfig};
pub use distortion::Distortion;
pub use eq::{Equalizer, FrequencyRange, SpectralEditConfig};
pub use filters::{BandCutFilter, BandPassFilter, HighPassFilter};
pub use stft::{SpectralEdit, StftEngine};
pub use window::{Window, WindowKind};

use sonance_core::{AudioBuffer, Sample, SonanceResult};

/// Trait for all DSP processors
pub trait Processor: Send {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    ///
    /// Frames of look-ahead read past the end of a chunk. A caller that
    /// holds back this many frames before processing gets output identical
    /// to processing the whole signal at once.
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Processor working on whole multichannel buffers
///
/// `process` handles the frames `[start, start + frame_count)` of `input` and
/// adds its result into the same frames of `output`.
pub trait BufferProcessor: Processor {
    fn process(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        start: usize,
        frame_count: usize,
    ) -> SonanceResult<()>;

    /// Replace the buffer contents with the processed signal
    fn process_in_place(&mut self, buffer: &mut AudioBuffer) -> SonanceResult<()> {
        let input = buffer.clone();
        buffer.clear();
        let frame_count = input.frame_count();
        if let Err(e) = self.process(&input, buffer, 0, frame_count) {
            *buffer = input;
            return Err(e);
        }
        Ok(())
    }
}
