//! Spectral equalizer
//!
//! A list of frequency ranges, each with a linear gain, applied to the
//! spectrum of every STFT frame. Ranges are independent: overlapping ranges
//! multiply, and anything outside every range passes at unity gain.

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use sonance_core::{AudioBuffer, Decibels, SonanceError, SonanceResult};

use crate::config::{EqualizerPreset, StftConfig};
use crate::stft::{SpectralEdit, StftEngine};
use crate::transform::{freq_to_bin, nyquist_bin};
use crate::{BufferProcessor, Processor};

/// Gain applied between two frequencies (Hz)
///
/// `f1` and `f2` may come in either order. Either may be `+inf` for an open
/// upper bound, serialized as the string `"inf"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    #[serde(with = "frequency_serde")]
    pub f1: f64,
    #[serde(with = "frequency_serde")]
    pub f2: f64,
    pub gain: f64,
}

/// JSON has no infinity: `+inf` round-trips as `"inf"`
mod frequency_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(freq: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *freq == f64::INFINITY {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_f64(*freq)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(freq) => Ok(freq),
            Repr::Text(text) if text.eq_ignore_ascii_case("inf") => Ok(f64::INFINITY),
            Repr::Text(text) => Err(D::Error::custom(format!(
                "expected a frequency or \"inf\", got \"{text}\""
            ))),
        }
    }
}

impl FrequencyRange {
    pub fn new(f1: f64, f2: f64, gain: f64) -> SonanceResult<Self> {
        let range = Self { f1, f2, gain };
        range.validate()?;
        Ok(range)
    }

    /// Range with its gain given in dB
    pub fn with_gain_db(f1: f64, f2: f64, gain: Decibels) -> SonanceResult<Self> {
        Self::new(f1, f2, gain.to_gain())
    }

    pub fn validate(&self) -> SonanceResult<()> {
        // `!(x >= 0.0)` also catches NaN
        if !(self.f1 >= 0.0) || !(self.f2 >= 0.0) {
            return Err(SonanceError::invalid(format!(
                "frequencies must be non-negative, got {} and {}",
                self.f1, self.f2
            )));
        }
        if !self.gain.is_finite() {
            return Err(SonanceError::invalid(format!(
                "gain must be finite, got {}",
                self.gain
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn low(&self) -> f64 {
        self.f1.min(self.f2)
    }

    #[inline]
    pub fn high(&self) -> f64 {
        self.f1.max(self.f2)
    }
}

/// Ordered frequency ranges applied to each analysis frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FrequencyRange>", into = "Vec<FrequencyRange>")]
pub struct SpectralEditConfig {
    ranges: Vec<FrequencyRange>,
}

impl SpectralEditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ranges(ranges: Vec<FrequencyRange>) -> SonanceResult<Self> {
        for range in &ranges {
            range.validate()?;
        }
        Ok(Self { ranges })
    }

    /// Append a range. The list is unchanged on error.
    pub fn add_range(&mut self, f1: f64, f2: f64, gain: f64) -> SonanceResult<()> {
        let range = FrequencyRange::new(f1, f2, gain)?;
        self.ranges.push(range);
        Ok(())
    }

    pub fn modify_range(&mut self, index: usize, range: FrequencyRange) -> SonanceResult<()> {
        let len = self.ranges.len();
        let slot = self
            .ranges
            .get_mut(index)
            .ok_or(SonanceError::OutOfBounds { index, len })?;
        range.validate()?;
        *slot = range;
        Ok(())
    }

    pub fn remove_range(&mut self, index: usize) -> SonanceResult<FrequencyRange> {
        if index >= self.ranges.len() {
            return Err(SonanceError::OutOfBounds {
                index,
                len: self.ranges.len(),
            });
        }
        Ok(self.ranges.remove(index))
    }

    #[inline]
    pub fn ranges(&self) -> &[FrequencyRange] {
        &self.ranges
    }

    #[inline]
    pub fn range(&self, index: usize) -> Option<&FrequencyRange> {
        self.ranges.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Scale the bins of each range and rewrite their conjugate partners
    ///
    /// A range covers bins `[bin(low), bin(high))`. Ranges reaching the
    /// Nyquist frequency include the Nyquist bin.
    pub fn apply_to(&self, spectrum: &mut [Complex<f64>], sample_rate: f64, transform_size: usize) {
        debug_assert_eq!(spectrum.len(), transform_size);

        let nyquist = nyquist_bin(transform_size);
        let nyquist_freq = sample_rate * 0.5;

        for range in &self.ranges {
            let low = range.low();
            let high = range.high();
            if low > nyquist_freq {
                continue;
            }

            let start_bin = freq_to_bin(low, sample_rate, transform_size);
            let end_bin = if high >= nyquist_freq {
                nyquist + 1
            } else {
                freq_to_bin(high, sample_rate, transform_size).min(nyquist)
            };

            for k in start_bin..end_bin {
                spectrum[k] *= range.gain;
                let mirror = transform_size - k;
                if k != 0 && mirror != k {
                    spectrum[mirror] = spectrum[k].conj();
                }
            }
        }
    }
}

impl SpectralEdit for SpectralEditConfig {
    fn apply(&self, spectrum: &mut [Complex<f64>], sample_rate: f64) {
        self.apply_to(spectrum, sample_rate, spectrum.len());
    }
}

impl TryFrom<Vec<FrequencyRange>> for SpectralEditConfig {
    type Error = SonanceError;

    fn try_from(ranges: Vec<FrequencyRange>) -> SonanceResult<Self> {
        Self::from_ranges(ranges)
    }
}

impl From<SpectralEditConfig> for Vec<FrequencyRange> {
    fn from(config: SpectralEditConfig) -> Self {
        config.ranges
    }
}

/// STFT equalizer effect
#[derive(Debug, Clone)]
pub struct Equalizer {
    engine: StftEngine,
    config: SpectralEditConfig,
}

impl Equalizer {
    /// Equalizer with no ranges (unity gain)
    pub fn new(stft: &StftConfig) -> SonanceResult<Self> {
        Ok(Self::with_engine(StftEngine::from_config(stft)?))
    }

    pub fn with_engine(engine: StftEngine) -> Self {
        Self {
            engine,
            config: SpectralEditConfig::new(),
        }
    }

    pub fn from_preset(preset: &EqualizerPreset) -> SonanceResult<Self> {
        let mut eq = Self::new(&preset.stft)?;
        eq.config = preset.ranges.clone();
        log::debug!(
            "equalizer preset '{}': {} ranges",
            preset.name,
            eq.config.len()
        );
        Ok(eq)
    }

    pub fn add_range(&mut self, f1: f64, f2: f64, gain: f64) -> SonanceResult<()> {
        self.config.add_range(f1, f2, gain)
    }

    pub fn modify_range(&mut self, index: usize, range: FrequencyRange) -> SonanceResult<()> {
        self.config.modify_range(index, range)
    }

    pub fn remove_range(&mut self, index: usize) -> SonanceResult<FrequencyRange> {
        self.config.remove_range(index)
    }

    pub fn clear_ranges(&mut self) {
        self.config.clear();
    }

    #[inline]
    pub fn ranges(&self) -> &[FrequencyRange] {
        self.config.ranges()
    }

    #[inline]
    pub fn config(&self) -> &SpectralEditConfig {
        &self.config
    }

    #[inline]
    pub fn engine(&self) -> &StftEngine {
        &self.engine
    }
}

impl Processor for Equalizer {
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn latency(&self) -> usize {
        self.engine.latency()
    }
}

impl BufferProcessor for Equalizer {
    fn process(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        start: usize,
        frame_count: usize,
    ) -> SonanceResult<()> {
        self.engine
            .process(&self.config, input, output, start, frame_count)
    }
}
