//! Streaming STFT overlap-add engine
//!
//! Processes a continuous signal delivered in arbitrary chunks. Analysis
//! frames sit on an absolute hop grid (frame starts are multiples of
//! `hop_size` counted from the first sample ever processed), so chunk
//! boundaries never shift the frame layout.
//!
//! Per frame and channel:
//!
//! ```text
//! taps ──► × window ──► FFT ──► SpectralEdit ──► IFFT ──► × window × norm / N ──► += output
//! ```
//!
//! Taps that precede the chunk come from a retained tail of the last
//! `transform_size` input frames. Taps past the end of the input buffer are
//! silence. Every output sample receives the sum of all frames covering it,
//! divided by the overlapped squared-window weight at its hop phase.

use std::collections::VecDeque;

use rustfft::num_complex::Complex;
use sonance_core::{AudioBuffer, Sample, SonanceError, SonanceResult};

use crate::config::StftConfig;
use crate::transform::SpectrumTransform;
use crate::window::Window;

/// Overlapped window weight below which a hop phase counts as uncovered
const MIN_OVERLAP_WEIGHT: f64 = 1e-9;

/// Per-frame spectral modification
///
/// `spectrum` holds the full complex transform of one analysis frame. The
/// edit must keep it conjugate-symmetric so the inverse stays real.
pub trait SpectralEdit {
    fn apply(&self, spectrum: &mut [Complex<f64>], sample_rate: f64);
}

/// Streaming frame state for one effect instance
#[derive(Debug, Clone)]
pub struct StftEngine {
    transform: SpectrumTransform,
    window: Window,
    /// Window materialized once, indexed by tap
    window_table: Vec<Sample>,
    hop_size: usize,
    /// `1 / Σ w²` for each hop phase
    overlap_norm: Vec<Sample>,
    max_overlap_count: usize,
    /// Newest input frames per channel, at most `transform_size` long
    past_samples: Vec<VecDeque<Sample>>,
    /// Absolute index of the next input frame
    position: u64,
    frame_buffer: Vec<Complex<f64>>,
}

impl StftEngine {
    /// Engine whose transform size is the window size
    pub fn new(window: Window, hop_size: usize) -> SonanceResult<Self> {
        let transform_size = window.size();
        let transform = SpectrumTransform::new(transform_size)?;

        if hop_size == 0 {
            return Err(SonanceError::invalid("hop size must be at least 1"));
        }
        if hop_size > transform_size {
            return Err(SonanceError::invalid(format!(
                "hop size {hop_size} exceeds transform size {transform_size}"
            )));
        }

        let window_table = window.generate_buffer();
        let mut overlap_norm = Vec::with_capacity(hop_size);
        for phase in 0..hop_size {
            let weight: f64 = window_table[phase..]
                .iter()
                .step_by(hop_size)
                .map(|w| w * w)
                .sum();
            if weight < MIN_OVERLAP_WEIGHT {
                log::warn!(
                    "rejecting {:?} window of {transform_size} with hop {hop_size}: phase {phase} uncovered",
                    window.kind()
                );
                return Err(SonanceError::invalid(format!(
                    "{:?} window with hop {hop_size} leaves samples at phase {phase} uncovered",
                    window.kind()
                )));
            }
            overlap_norm.push(1.0 / weight);
        }

        let max_overlap_count = transform_size.div_ceil(hop_size);
        log::debug!(
            "stft engine: size {transform_size}, hop {hop_size}, {:?} window, max overlap {max_overlap_count}",
            window.kind()
        );

        Ok(Self {
            transform,
            window,
            window_table,
            hop_size,
            overlap_norm,
            max_overlap_count,
            past_samples: Vec::new(),
            position: 0,
            frame_buffer: vec![Complex::new(0.0, 0.0); transform_size],
        })
    }

    pub fn from_config(config: &StftConfig) -> SonanceResult<Self> {
        config.validate()?;
        Self::new(config.window()?, config.hop_size)
    }

    #[inline]
    pub fn transform_size(&self) -> usize {
        self.transform.size()
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    #[inline]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Most frames that can overlap a single output sample
    #[inline]
    pub fn max_overlap_count(&self) -> usize {
        self.max_overlap_count
    }

    /// Look-ahead a frame starting in the last chunk sample can reach
    #[inline]
    pub fn latency(&self) -> usize {
        self.transform_size() - 1
    }

    /// Frames consumed since construction or the last reset
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Frames of history currently held per channel
    pub fn retained_frames(&self) -> usize {
        self.past_samples.first().map_or(0, VecDeque::len)
    }

    /// Forget all history and restart the hop grid at zero
    pub fn reset(&mut self) {
        self.past_samples.clear();
        self.position = 0;
    }

    /// Process input frames `[start, start + frame_count)` as the next chunk
    /// of the stream, adding the result into the same frames of `output`.
    ///
    /// Frames of `input` after the chunk are used as look-ahead for frames
    /// that straddle the chunk end. Nothing is written when validation fails.
    pub fn process<E: SpectralEdit + ?Sized>(
        &mut self,
        editor: &E,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        start: usize,
        frame_count: usize,
    ) -> SonanceResult<()> {
        let end = start
            .checked_add(frame_count)
            .filter(|&end| end <= input.frame_count())
            .ok_or(SonanceError::OutOfBounds {
                index: start.saturating_add(frame_count),
                len: input.frame_count(),
            })?;

        let channels = input.channel_count();
        if output.channel_count() != channels {
            return Err(SonanceError::ChannelMismatch {
                expected: channels,
                actual: output.channel_count(),
            });
        }
        if !self.past_samples.is_empty() && self.past_samples.len() != channels {
            return Err(SonanceError::ChannelMismatch {
                expected: self.past_samples.len(),
                actual: channels,
            });
        }
        if frame_count == 0 {
            return Ok(());
        }
        if self.past_samples.is_empty() {
            self.past_samples = vec![VecDeque::with_capacity(self.transform_size()); channels];
        }

        log::trace!(
            "stft chunk: {frame_count} frames x {channels} ch at stream position {}",
            self.position
        );

        let n = self.transform_size();
        let hop = self.hop_size as i64;
        let scale = 1.0 / n as f64;
        let sample_rate = input.format().sample_rate_f64();

        let chunk_start = self.position as i64;
        let chunk_end = chunk_start + frame_count as i64;
        let input_frames = input.frame_count() as i64;
        let output_frames = output.frame_count() as i64;
        // Absolute position `a` maps to buffer frame `a - offset`
        let offset = chunk_start - start as i64;

        let mut frame_start = first_frame_start(chunk_start, n, self.hop_size);
        while frame_start < chunk_end {
            for ch in 0..channels {
                let history = &self.past_samples[ch];

                for (k, tap) in self.frame_buffer.iter_mut().enumerate() {
                    let abs = frame_start + k as i64;
                    let sample = if abs < chunk_start {
                        let back = (chunk_start - abs) as usize;
                        if back <= history.len() {
                            history[history.len() - back]
                        } else {
                            0.0
                        }
                    } else {
                        let l = abs - offset;
                        if l < input_frames {
                            input[l as usize][ch]
                        } else {
                            0.0
                        }
                    };
                    *tap = Complex::new(sample * self.window_table[k], 0.0);
                }

                self.transform.forward(&mut self.frame_buffer);
                editor.apply(&mut self.frame_buffer, sample_rate);
                self.transform.inverse(&mut self.frame_buffer);

                // Only taps inside the chunk are written
                let k_begin = (chunk_start - frame_start).max(0) as usize;
                let k_end = ((chunk_end - frame_start) as usize).min(n);
                for k in k_begin..k_end {
                    let abs = frame_start + k as i64;
                    let l = abs - offset;
                    if l >= output_frames {
                        break;
                    }
                    let phase = abs.rem_euclid(hop) as usize;
                    output[l as usize][ch] += self.frame_buffer[k].re
                        * self.window_table[k]
                        * self.overlap_norm[phase]
                        * scale;
                }
            }
            frame_start += hop;
        }

        self.retain_tail(input, start, end, n);
        self.position += frame_count as u64;
        Ok(())
    }

    fn retain_tail(&mut self, input: &AudioBuffer, start: usize, end: usize, limit: usize) {
        let keep_from = end.saturating_sub(limit).max(start);
        for (ch, history) in self.past_samples.iter_mut().enumerate() {
            for frame in keep_from..end {
                history.push_back(input[frame][ch]);
            }
            while history.len() > limit {
                history.pop_front();
            }
        }
    }
}

/// Earliest hop-grid frame start whose frame reaches `chunk_start`
///
/// May be negative: frames starting before the stream see silence there.
fn first_frame_start(chunk_start: i64, transform_size: usize, hop_size: usize) -> i64 {
    let hop = hop_size as i64;
    let earliest = chunk_start - (transform_size as i64 - 1);
    // ceil(earliest / hop) * hop
    -((-earliest).div_euclid(hop)) * hop
}
