//! Threshold distortion
//!
//! Hard clip against independent positive and negative thresholds.

use sonance_core::{AudioBuffer, Sample, SonanceError, SonanceResult};

use crate::{BufferProcessor, MonoProcessor, Processor};

/// Clips samples above `positive` or below `negative`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    positive: Sample, // [0, 1]
    negative: Sample, // [-1, 0]
}

impl Default for Distortion {
    fn default() -> Self {
        Self {
            positive: 1.0,
            negative: -1.0,
        }
    }
}

impl Distortion {
    /// Full-scale thresholds (no clipping of normalized audio)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(positive: Sample, negative: Sample) -> Self {
        let mut distortion = Self::new();
        distortion.set_thresholds(positive, negative);
        distortion
    }

    /// Saturate `positive` into [0, 1] and `negative` into [-1, 0]
    ///
    /// A NaN threshold is ignored and the previous value kept.
    pub fn set_thresholds(&mut self, positive: Sample, negative: Sample) {
        if positive.is_nan() || negative.is_nan() {
            log::warn!("ignoring NaN distortion threshold ({positive}, {negative})");
        }
        if !positive.is_nan() {
            self.positive = positive.clamp(0.0, 1.0);
        }
        if !negative.is_nan() {
            self.negative = negative.clamp(-1.0, 0.0);
        }
    }

    #[inline]
    pub fn positive(&self) -> Sample {
        self.positive
    }

    #[inline]
    pub fn negative(&self) -> Sample {
        self.negative
    }

    #[inline]
    pub fn distort(&self, sample: Sample) -> Sample {
        if sample > self.positive {
            self.positive
        } else if sample < self.negative {
            self.negative
        } else {
            sample
        }
    }
}

impl Processor for Distortion {
    fn reset(&mut self) {}
}

impl MonoProcessor for Distortion {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.distort(input)
    }
}

impl BufferProcessor for Distortion {
    fn process(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        start: usize,
        frame_count: usize,
    ) -> SonanceResult<()> {
        let end = start.saturating_add(frame_count);
        if end > input.frame_count() || end > output.frame_count() {
            return Err(SonanceError::OutOfBounds {
                index: end,
                len: input.frame_count().min(output.frame_count()),
            });
        }
        if output.channel_count() != input.channel_count() {
            return Err(SonanceError::ChannelMismatch {
                expected: input.channel_count(),
                actual: output.channel_count(),
            });
        }

        for frame in start..end {
            for (dst, &src) in output[frame].iter_mut().zip(&input[frame]) {
                *dst += self.distort(src);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonance_core::AudioFormat;

    #[test]
    fn test_thresholds_saturate() {
        let mut dist = Distortion::new();
        dist.set_thresholds(1.5, -2.0);
        assert_eq!(dist.positive(), 1.0);
        assert_eq!(dist.negative(), -1.0);

        dist.set_thresholds(-0.3, 0.4);
        assert_eq!(dist.positive(), 0.0);
        assert_eq!(dist.negative(), 0.0);

        dist.set_thresholds(f64::NAN, -0.5);
        assert_eq!(dist.positive(), 0.0);
        assert_eq!(dist.negative(), -0.5);
    }

    #[test]
    fn test_distort_clips() {
        let dist = Distortion::with_thresholds(1.5, -2.0);
        assert_eq!(dist.distort(0.5), 0.5);
        assert_eq!(dist.distort(2.0), 1.0);
        assert_eq!(dist.distort(-1.5), -1.0);

        let asym = Distortion::with_thresholds(0.25, -0.75);
        assert_eq!(asym.distort(0.5), 0.25);
        assert_eq!(asym.distort(-0.5), -0.5);
        assert_eq!(asym.distort(-0.9), -0.75);
    }

    #[test]
    fn test_process_block() {
        let mut dist = Distortion::with_thresholds(0.5, -0.5);
        let mut block = [0.9, -0.9, 0.1];
        dist.process_block(&mut block);
        assert_eq!(block, [0.5, -0.5, 0.1]);
    }

    #[test]
    fn test_buffer_in_place() {
        let mut dist = Distortion::with_thresholds(0.5, -0.25);
        let format = AudioFormat::stereo(48000).unwrap();
        let mut buffer = AudioBuffer::from_interleaved(vec![0.75, -0.75, 0.1, -0.1], format).unwrap();

        dist.process_in_place(&mut buffer).unwrap();
        assert_eq!(buffer.as_interleaved(), &[0.5, -0.25, 0.1, -0.1]);
    }
}
