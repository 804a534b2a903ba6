//! Band filters built from equalizer ranges
//!
//! Each filter owns a private [`Equalizer`] and only exposes the controls
//! that keep its range layout intact:
//!
//! | filter          | ranges (all gain 0)       |
//! |-----------------|---------------------------|
//! | HighPassFilter  | `[0, cutoff)`             |
//! | BandCutFilter   | `[f1, f2)`                |
//! | BandPassFilter  | `[0, low)`, `[high, inf)` |

use sonance_core::{AudioBuffer, SonanceResult};

use crate::config::StftConfig;
use crate::eq::{Equalizer, FrequencyRange};
use crate::stft::StftEngine;
use crate::{BufferProcessor, Processor};

/// Silences everything below the cutoff
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    eq: Equalizer,
}

impl HighPassFilter {
    pub fn new(stft: &StftConfig, cutoff: f64) -> SonanceResult<Self> {
        Self::with_engine(StftEngine::from_config(stft)?, cutoff)
    }

    pub fn with_engine(engine: StftEngine, cutoff: f64) -> SonanceResult<Self> {
        let mut eq = Equalizer::with_engine(engine);
        eq.add_range(0.0, cutoff, 0.0)?;
        log::debug!("high-pass at {cutoff} Hz");
        Ok(Self { eq })
    }

    pub fn cutoff(&self) -> f64 {
        self.eq.ranges()[0].f2
    }

    pub fn set_cutoff(&mut self, cutoff: f64) -> SonanceResult<()> {
        self.eq.modify_range(0, FrequencyRange::new(0.0, cutoff, 0.0)?)
    }
}

/// Silences one band
#[derive(Debug, Clone)]
pub struct BandCutFilter {
    eq: Equalizer,
}

impl BandCutFilter {
    pub fn new(stft: &StftConfig, f1: f64, f2: f64) -> SonanceResult<Self> {
        Self::with_engine(StftEngine::from_config(stft)?, f1, f2)
    }

    pub fn with_engine(engine: StftEngine, f1: f64, f2: f64) -> SonanceResult<Self> {
        let mut eq = Equalizer::with_engine(engine);
        eq.add_range(f1, f2, 0.0)?;
        log::debug!("band-cut {f1}..{f2} Hz");
        Ok(Self { eq })
    }

    /// Band edges as given
    pub fn frequencies(&self) -> (f64, f64) {
        let range = self.eq.ranges()[0];
        (range.f1, range.f2)
    }

    pub fn set_frequencies(&mut self, f1: f64, f2: f64) -> SonanceResult<()> {
        self.eq.modify_range(0, FrequencyRange::new(f1, f2, 0.0)?)
    }
}

/// Silences everything outside `[low, high]`
///
/// Edges are kept ordered: passing them reversed swaps them.
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    eq: Equalizer,
}

impl BandPassFilter {
    pub fn new(stft: &StftConfig, f1: f64, f2: f64) -> SonanceResult<Self> {
        Self::with_engine(StftEngine::from_config(stft)?, f1, f2)
    }

    pub fn with_engine(engine: StftEngine, f1: f64, f2: f64) -> SonanceResult<Self> {
        let (below, above) = band_ranges(f1, f2)?;
        let mut eq = Equalizer::with_engine(engine);
        eq.add_range(below.f1, below.f2, below.gain)?;
        eq.add_range(above.f1, above.f2, above.gain)?;
        log::debug!("band-pass {}..{} Hz", below.f2, above.f1);
        Ok(Self { eq })
    }

    pub fn low_cutoff(&self) -> f64 {
        self.eq.ranges()[0].f2
    }

    pub fn high_cutoff(&self) -> f64 {
        self.eq.ranges()[1].f1
    }

    pub fn set_low_cutoff(&mut self, freq: f64) -> SonanceResult<()> {
        self.set_band(freq, self.high_cutoff())
    }

    pub fn set_high_cutoff(&mut self, freq: f64) -> SonanceResult<()> {
        self.set_band(self.low_cutoff(), freq)
    }

    /// Move both edges. Both ranges are validated before either changes.
    pub fn set_band(&mut self, f1: f64, f2: f64) -> SonanceResult<()> {
        let (below, above) = band_ranges(f1, f2)?;
        self.eq.modify_range(0, below)?;
        self.eq.modify_range(1, above)
    }
}

/// The two stop ranges around an ordered pass band
fn band_ranges(f1: f64, f2: f64) -> SonanceResult<(FrequencyRange, FrequencyRange)> {
    let (low, high) = if f1 <= f2 { (f1, f2) } else { (f2, f1) };
    Ok((
        FrequencyRange::new(0.0, low, 0.0)?,
        FrequencyRange::new(high, f64::INFINITY, 0.0)?,
    ))
}

macro_rules! delegate_to_equalizer {
    ($($filter:ty),+) => {
        $(
            impl Processor for $filter {
                fn reset(&mut self) {
                    self.eq.reset();
                }

                fn latency(&self) -> usize {
                    self.eq.latency()
                }
            }

            impl BufferProcessor for $filter {
                fn process(
                    &mut self,
                    input: &AudioBuffer,
                    output: &mut AudioBuffer,
                    start: usize,
                    frame_count: usize,
                ) -> SonanceResult<()> {
                    self.eq.process(input, output, start, frame_count)
                }
            }
        )+
    };
}

delegate_to_equalizer!(HighPassFilter, BandCutFilter, BandPassFilter);
