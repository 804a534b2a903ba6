//! Sample types and audio buffer definitions

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{SonanceError, SonanceResult};

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Channel count and sample rate of a buffer
///
/// Both are non-zero. Deserialization goes through [`AudioFormat::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FormatFields")]
pub struct AudioFormat {
    channel_count: usize,
    sample_rate: u32,
}

/// Unchecked wire form of [`AudioFormat`]
#[derive(Deserialize)]
struct FormatFields {
    channel_count: usize,
    sample_rate: u32,
}

impl TryFrom<FormatFields> for AudioFormat {
    type Error = SonanceError;

    fn try_from(fields: FormatFields) -> SonanceResult<Self> {
        Self::new(fields.channel_count, fields.sample_rate)
    }
}

impl AudioFormat {
    pub fn new(channel_count: usize, sample_rate: u32) -> SonanceResult<Self> {
        if channel_count == 0 {
            return Err(SonanceError::invalid("channel count must be at least 1"));
        }
        if sample_rate == 0 {
            return Err(SonanceError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            channel_count,
            sample_rate,
        })
    }

    /// Mono at the given rate
    pub fn mono(sample_rate: u32) -> SonanceResult<Self> {
        Self::new(1, sample_rate)
    }

    /// Stereo at the given rate
    pub fn stereo(sample_rate: u32) -> SonanceResult<Self> {
        Self::new(2, sample_rate)
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn sample_rate_f64(&self) -> f64 {
        self.sample_rate as f64
    }
}

/// Channel-interleaved audio buffer
///
/// Indexed as `buffer[frame][channel]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<Sample>,
    format: AudioFormat,
}

impl AudioBuffer {
    /// Silent buffer of `frame_count` frames
    pub fn new(frame_count: usize, format: AudioFormat) -> Self {
        Self {
            samples: vec![0.0; frame_count * format.channel_count],
            format,
        }
    }

    pub fn from_interleaved(samples: Vec<Sample>, format: AudioFormat) -> SonanceResult<Self> {
        if samples.len() % format.channel_count != 0 {
            return Err(SonanceError::invalid(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                format.channel_count
            )));
        }
        Ok(Self { samples, format })
    }

    /// Build from planar channel data
    pub fn from_channels(channels: &[Vec<Sample>], sample_rate: u32) -> SonanceResult<Self> {
        let format = AudioFormat::new(channels.len(), sample_rate)?;
        let frame_count = channels[0].len();
        if let Some(ragged) = channels.iter().find(|c| c.len() != frame_count) {
            return Err(SonanceError::invalid(format!(
                "channel length {} differs from {}",
                ragged.len(),
                frame_count
            )));
        }

        let mut buffer = Self::new(frame_count, format);
        for (ch, data) in channels.iter().enumerate() {
            for (frame, &sample) in data.iter().enumerate() {
                buffer[frame][ch] = sample;
            }
        }
        Ok(buffer)
    }

    #[inline]
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.format.channel_count
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.format.channel_count
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn get(&self, frame: usize, channel: usize) -> Option<Sample> {
        if channel >= self.format.channel_count {
            return None;
        }
        self.samples
            .get(frame * self.format.channel_count + channel)
            .copied()
    }

    /// Copy of one channel
    pub fn channel(&self, channel: usize) -> Vec<Sample> {
        self.frames().map(|frame| frame[channel]).collect()
    }

    /// Iterate over frames (one slice of `channel_count` samples each)
    pub fn frames(&self) -> impl Iterator<Item = &[Sample]> {
        self.samples.chunks_exact(self.format.channel_count)
    }

    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn as_interleaved_mut(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Add `other` sample-by-sample into this buffer
    ///
    /// Frames past the shorter buffer are left alone.
    pub fn accumulate(&mut self, other: &AudioBuffer) -> SonanceResult<()> {
        if other.channel_count() != self.channel_count() {
            return Err(SonanceError::ChannelMismatch {
                expected: self.channel_count(),
                actual: other.channel_count(),
            });
        }
        for (dst, &src) in self.samples.iter_mut().zip(&other.samples) {
            *dst += src;
        }
        Ok(())
    }

    /// Copy `frame_count` frames starting at `start`
    pub fn slice(&self, start: usize, frame_count: usize) -> SonanceResult<AudioBuffer> {
        let end = start
            .checked_add(frame_count)
            .filter(|&end| end <= self.frame_count())
            .ok_or(SonanceError::OutOfBounds {
                index: start.saturating_add(frame_count),
                len: self.frame_count(),
            })?;
        let ch = self.format.channel_count;
        Ok(Self {
            samples: self.samples[start * ch..end * ch].to_vec(),
            format: self.format,
        })
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> Sample {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }
}

impl Index<usize> for AudioBuffer {
    type Output = [Sample];

    #[inline]
    fn index(&self, frame: usize) -> &[Sample] {
        let ch = self.format.channel_count;
        &self.samples[frame * ch..(frame + 1) * ch]
    }
}

impl IndexMut<usize> for AudioBuffer {
    #[inline]
    fn index_mut(&mut self, frame: usize) -> &mut [Sample] {
        let ch = self.format.channel_count;
        &mut self.samples[frame * ch..(frame + 1) * ch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_validation() {
        assert!(AudioFormat::new(0, 48000).is_err());
        assert_eq!(
            AudioFormat::new(2, 0),
            Err(SonanceError::InvalidSampleRate(0))
        );
        assert!(AudioFormat::stereo(44100).is_ok());
    }

    #[test]
    fn test_format_json_is_validated() {
        let format: AudioFormat =
            serde_json::from_str(r#"{ "channel_count": 2, "sample_rate": 44100 }"#).unwrap();
        assert_eq!(format.channel_count(), 2);
        assert_eq!(format.sample_rate(), 44100);

        for json in [
            r#"{ "channel_count": 0, "sample_rate": 48000 }"#,
            r#"{ "channel_count": 1, "sample_rate": 0 }"#,
        ] {
            assert!(serde_json::from_str::<AudioFormat>(json).is_err(), "{json}");
        }

        let json = serde_json::to_string(&format).unwrap();
        assert_eq!(serde_json::from_str::<AudioFormat>(&json).unwrap(), format);
    }

    #[test]
    fn test_frame_indexing() {
        let format = AudioFormat::stereo(48000).unwrap();
        let mut buffer = AudioBuffer::new(4, format);
        buffer[2][1] = 0.5;

        assert_eq!(buffer.frame_count(), 4);
        assert_eq!(buffer.as_interleaved()[5], 0.5);
        assert_eq!(buffer.get(2, 1), Some(0.5));
        assert_eq!(buffer.get(2, 2), None);
        assert_eq!(buffer.get(4, 0), None);
    }

    #[test]
    fn test_from_channels() {
        let buffer =
            AudioBuffer::from_channels(&[vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]], 48000)
                .unwrap();
        assert_eq!(buffer.as_interleaved(), &[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert_eq!(buffer.channel(1), vec![-1.0, -2.0, -3.0]);

        assert!(AudioBuffer::from_channels(&[vec![1.0], vec![1.0, 2.0]], 48000).is_err());
    }

    #[test]
    fn test_from_interleaved_rejects_partial_frame() {
        let format = AudioFormat::stereo(48000).unwrap();
        assert!(AudioBuffer::from_interleaved(vec![0.0; 3], format).is_err());
    }

    #[test]
    fn test_accumulate() {
        let format = AudioFormat::mono(48000).unwrap();
        let mut a = AudioBuffer::from_interleaved(vec![0.25, 0.5], format).unwrap();
        let b = AudioBuffer::from_interleaved(vec![0.25, -0.5], format).unwrap();
        a.accumulate(&b).unwrap();
        assert_eq!(a.as_interleaved(), &[0.5, 0.0]);

        let stereo = AudioBuffer::new(2, AudioFormat::stereo(48000).unwrap());
        assert!(matches!(
            a.accumulate(&stereo),
            Err(SonanceError::ChannelMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_slice_and_peak() {
        let format = AudioFormat::mono(48000).unwrap();
        let buffer = AudioBuffer::from_interleaved(vec![0.1, -0.9, 0.3, 0.2], format).unwrap();
        let part = buffer.slice(1, 2).unwrap();
        assert_eq!(part.as_interleaved(), &[-0.9, 0.3]);
        assert!((buffer.peak() - 0.9).abs() < 1e-12);
        assert!(buffer.slice(3, 2).is_err());
    }
}
