//! Sample sources feeding the render path

use std::f64::consts::TAU;

use sonance_core::{AudioBuffer, AudioFormat, Sample, SonanceError, SonanceResult};

/// Audio source pulled by [`Playback`](crate::Playback)
pub trait SampleSource: Send {
    /// Layout of the frames this source produces
    fn format(&self) -> AudioFormat;

    /// Overwrite `buffer` with the next frames and return how many were real
    /// audio. Frames after that count are left silent.
    fn fill(&mut self, buffer: &mut AudioBuffer) -> usize;

    /// Check if source is finished (for one-shot playback)
    fn is_finished(&self) -> bool {
        false
    }

    /// Reset source to beginning
    fn reset(&mut self) {}
}

/// In-memory buffer player
#[derive(Debug, Clone)]
pub struct BufferSource {
    buffer: AudioBuffer,
    position: usize,
    looping: bool,
}

impl BufferSource {
    pub fn new(buffer: AudioBuffer) -> Self {
        Self {
            buffer,
            position: 0,
            looping: false,
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Next frame to be read
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, frame: usize) -> SonanceResult<()> {
        if frame > self.buffer.frame_count() {
            return Err(SonanceError::OutOfBounds {
                index: frame,
                len: self.buffer.frame_count(),
            });
        }
        self.position = frame;
        Ok(())
    }
}

impl SampleSource for BufferSource {
    fn format(&self) -> AudioFormat {
        self.buffer.format()
    }

    fn fill(&mut self, buffer: &mut AudioBuffer) -> usize {
        buffer.clear();
        let len = self.buffer.frame_count();
        let channels = buffer.channel_count().min(self.buffer.channel_count());
        let mut written = 0;

        for frame in 0..buffer.frame_count() {
            if self.position >= len {
                if !self.looping || len == 0 {
                    break;
                }
                self.position = 0;
            }
            let src = &self.buffer[self.position];
            buffer[frame][..channels].copy_from_slice(&src[..channels]);
            self.position += 1;
            written += 1;
        }
        written
    }

    fn is_finished(&self) -> bool {
        !self.looping && self.position >= self.buffer.frame_count()
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

/// Simple test tone generator, same signal on every channel
#[derive(Debug, Clone)]
pub struct TestTone {
    format: AudioFormat,
    phase: f64,
    frequency: f64,
    amplitude: Sample,
}

impl TestTone {
    pub fn new(frequency: f64, format: AudioFormat) -> Self {
        Self {
            format,
            phase: 0.0,
            frequency,
            amplitude: 0.5,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, freq: f64) {
        self.frequency = freq;
    }

    pub fn amplitude(&self) -> Sample {
        self.amplitude
    }

    pub fn set_amplitude(&mut self, amp: Sample) {
        self.amplitude = amp.clamp(0.0, 1.0);
    }
}

impl SampleSource for TestTone {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn fill(&mut self, buffer: &mut AudioBuffer) -> usize {
        let phase_inc = self.frequency * TAU / self.format.sample_rate_f64();

        for frame in 0..buffer.frame_count() {
            let sample = self.phase.sin() * self.amplitude;
            buffer[frame].fill(sample);

            self.phase += phase_inc;
            if self.phase > TAU {
                self.phase -= TAU;
            }
        }
        buffer.frame_count()
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_clip(samples: Vec<Sample>) -> AudioBuffer {
        AudioBuffer::from_interleaved(samples, AudioFormat::mono(48000).unwrap()).unwrap()
    }

    #[test]
    fn test_test_tone() {
        let format = AudioFormat::stereo(48000).unwrap();
        let mut tone = TestTone::new(440.0, format);
        let mut buffer = AudioBuffer::new(256, format);

        assert_eq!(tone.fill(&mut buffer), 256);

        // Should produce non-zero output
        assert!(buffer.peak() > 0.0);
        assert!(buffer.peak() <= 0.5);

        for frame in buffer.frames() {
            assert!((frame[0] - frame[1]).abs() < 1e-10);
        }
        assert!(!tone.is_finished());
    }

    #[test]
    fn test_buffer_source_one_shot() {
        let mut source = BufferSource::new(mono_clip(vec![0.1, 0.2, 0.3, 0.4]));
        let mut buffer = AudioBuffer::new(6, source.format());

        assert_eq!(source.fill(&mut buffer), 4);

        // First 4 samples from the clip, last 2 are zero
        assert_eq!(buffer.as_interleaved(), &[0.1, 0.2, 0.3, 0.4, 0.0, 0.0]);
        assert!(source.is_finished());

        assert_eq!(source.fill(&mut buffer), 0);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_buffer_source_looping() {
        let mut source = BufferSource::new(mono_clip(vec![0.1, 0.2, 0.3]));
        source.set_looping(true);
        let mut buffer = AudioBuffer::new(7, source.format());

        assert_eq!(source.fill(&mut buffer), 7);
        assert_eq!(
            buffer.as_interleaved(),
            &[0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1]
        );
        assert!(!source.is_finished());
        assert_eq!(source.position(), 1);
    }

    #[test]
    fn test_buffer_source_seek_and_reset() {
        let mut source = BufferSource::new(mono_clip(vec![0.1, 0.2, 0.3]));
        source.seek(2).unwrap();
        assert!(source.seek(4).is_err());
        assert_eq!(source.position(), 2);

        let mut buffer = AudioBuffer::new(2, source.format());
        assert_eq!(source.fill(&mut buffer), 1);
        assert_eq!(buffer.as_interleaved(), &[0.3, 0.0]);

        source.reset();
        assert!(!source.is_finished());
        assert_eq!(source.position(), 0);
    }
}
