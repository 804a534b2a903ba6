//! Complex FFT primitive and frequency/bin mapping

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use sonance_core::{SonanceError, SonanceResult};

/// Minimum transform size
pub const MIN_TRANSFORM_SIZE: usize = 16;
/// Maximum transform size
pub const MAX_TRANSFORM_SIZE: usize = 65536;

/// Forward/inverse complex FFT pair of a fixed size
///
/// The inverse is unnormalized: a forward/inverse round trip scales by `size`.
#[derive(Clone)]
pub struct SpectrumTransform {
    size: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl SpectrumTransform {
    pub fn new(size: usize) -> SonanceResult<Self> {
        if !(MIN_TRANSFORM_SIZE..=MAX_TRANSFORM_SIZE).contains(&size) || !size.is_power_of_two() {
            return Err(SonanceError::invalid(format!(
                "transform size must be a power of two in {MIN_TRANSFORM_SIZE}..={MAX_TRANSFORM_SIZE}, got {size}"
            )));
        }

        let mut planner = FftPlanner::<f64>::new();
        Ok(Self {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// In-place forward transform. `buffer.len()` must equal `size`.
    #[inline]
    pub fn forward(&self, buffer: &mut [Complex<f64>]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.forward.process(buffer);
    }

    /// In-place unscaled inverse transform. `buffer.len()` must equal `size`.
    #[inline]
    pub fn inverse(&self, buffer: &mut [Complex<f64>]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.inverse.process(buffer);
    }
}

impl std::fmt::Debug for SpectrumTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumTransform")
            .field("size", &self.size)
            .finish()
    }
}

/// Bin index for a frequency. Saturates for frequencies past `usize::MAX` bins.
#[inline]
pub fn freq_to_bin(freq: f64, sample_rate: f64, size: usize) -> usize {
    debug_assert!(sample_rate > 0.0);
    // `as` saturates, so +inf lands on usize::MAX
    ((freq * size as f64) / sample_rate).round() as usize
}

/// Centre frequency of a bin
#[inline]
pub fn bin_to_freq(bin: usize, sample_rate: f64, size: usize) -> f64 {
    bin as f64 * sample_rate / size as f64
}

/// Bin holding half the sample rate
#[inline]
pub fn nyquist_bin(size: usize) -> usize {
    size / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_validation() {
        assert!(SpectrumTransform::new(1024).is_ok());
        assert!(SpectrumTransform::new(1000).is_err());
        assert!(SpectrumTransform::new(8).is_err());
        assert!(SpectrumTransform::new(0).is_err());
        assert!(SpectrumTransform::new(MAX_TRANSFORM_SIZE * 2).is_err());
    }

    #[test]
    fn test_roundtrip_scales_by_size() {
        let transform = SpectrumTransform::new(64).unwrap();
        let input: Vec<Complex<f64>> = (0..64)
            .map(|i| Complex::new((i as f64 * 0.3).sin(), 0.0))
            .collect();

        let mut buffer = input.clone();
        transform.forward(&mut buffer);
        transform.inverse(&mut buffer);

        for (out, orig) in buffer.iter().zip(&input) {
            assert!((out.re / 64.0 - orig.re).abs() < 1e-12);
            assert!((out.im / 64.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let size = 256;
        let sample_rate = 48000.0;
        let bin = 10;
        let freq = bin_to_freq(bin, sample_rate, size);

        let transform = SpectrumTransform::new(size).unwrap();
        let mut buffer: Vec<Complex<f64>> = (0..size)
            .map(|i| {
                let t = i as f64 / sample_rate;
                Complex::new((2.0 * std::f64::consts::PI * freq * t).sin(), 0.0)
            })
            .collect();
        transform.forward(&mut buffer);

        let peak = (0..nyquist_bin(size))
            .max_by(|&a, &b| buffer[a].norm().total_cmp(&buffer[b].norm()))
            .unwrap();
        assert_eq!(peak, bin);
        assert_eq!(freq_to_bin(freq, sample_rate, size), bin);
    }

    #[test]
    fn test_freq_to_bin_edges() {
        assert_eq!(freq_to_bin(0.0, 48000.0, 1024), 0);
        assert_eq!(freq_to_bin(24000.0, 48000.0, 1024), nyquist_bin(1024));
        assert_eq!(freq_to_bin(f64::INFINITY, 48000.0, 1024), usize::MAX);
    }
}
