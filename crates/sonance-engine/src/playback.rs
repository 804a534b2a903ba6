//! Effect chain playback
//!
//! ```text
//! SampleSource ──► stage[0] ──► stage[1] ──► ... ──► Distortion ──► block
//! ```
//!
//! Each stage holds back `latency()` frames of its input so the effect always
//! sees real look-ahead past the frames it processes, and passes on only the
//! frames it has finished. The chain latency is paid once, as silence at the
//! head of the output queue, so block size has no influence on the rendered
//! signal.

use sonance_core::{AudioBuffer, AudioFormat, Sample, SonanceResult};
use sonance_dsp::{BufferProcessor, Distortion, MonoProcessor, Processor};

use crate::source::SampleSource;

/// One effect plus its held-back input (interleaved samples)
struct EffectStage {
    effect: Box<dyn BufferProcessor>,
    latency: usize,
    /// Input frames not yet processed, at most `latency` between calls
    pending: Vec<Sample>,
}

impl EffectStage {
    fn new(effect: Box<dyn BufferProcessor>) -> Self {
        let latency = effect.latency();
        Self {
            effect,
            latency,
            pending: Vec::new(),
        }
    }

    /// Feed `block` and return every frame whose look-ahead is now complete
    fn process(&mut self, block: AudioBuffer) -> SonanceResult<AudioBuffer> {
        let format = block.format();

        if self.latency == 0 {
            let frame_count = block.frame_count();
            let mut processed = AudioBuffer::new(frame_count, format);
            self.effect.process(&block, &mut processed, 0, frame_count)?;
            return Ok(processed);
        }

        let channels = format.channel_count();
        self.pending.extend_from_slice(block.as_interleaved());
        let pending_frames = self.pending.len() / channels;
        let available = pending_frames.saturating_sub(self.latency);
        if available == 0 {
            return Ok(AudioBuffer::new(0, format));
        }

        let input = AudioBuffer::from_interleaved(self.pending.clone(), format)?;
        let mut processed = AudioBuffer::new(pending_frames, format);
        self.effect.process(&input, &mut processed, 0, available)?;
        self.pending.drain(..available * channels);

        processed.slice(0, available)
    }

    fn reset(&mut self) {
        self.effect.reset();
        self.pending.clear();
    }
}

/// Renders a source through an ordered effect chain
pub struct Playback {
    source: Box<dyn SampleSource>,
    stages: Vec<EffectStage>,
    /// Finished frames not yet returned, led by `latency()` frames of silence
    output_queue: Vec<Sample>,
    distortion: Option<Distortion>,
    frames_rendered: u64,
}

impl Playback {
    pub fn new(source: Box<dyn SampleSource>) -> Self {
        Self {
            source,
            stages: Vec::new(),
            output_queue: Vec::new(),
            distortion: None,
            frames_rendered: 0,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.source.format()
    }

    /// Append an effect to the end of the chain
    ///
    /// Output is delayed by the effect's latency from here on.
    pub fn add_effect(&mut self, effect: Box<dyn BufferProcessor>) {
        let stage = EffectStage::new(effect);
        let channels = self.source.format().channel_count();
        self.output_queue
            .resize(self.output_queue.len() + stage.latency * channels, 0.0);
        self.stages.push(stage);
        log::debug!(
            "playback chain: {} effect(s), {} frames latency",
            self.stages.len(),
            self.latency()
        );
    }

    /// Builder form of [`add_effect`](Self::add_effect)
    pub fn with_effect(mut self, effect: impl BufferProcessor + 'static) -> Self {
        self.add_effect(Box::new(effect));
        self
    }

    pub fn effect_count(&self) -> usize {
        self.stages.len()
    }

    /// Remove every effect, dropping output still in flight
    pub fn clear_effects(&mut self) {
        self.stages.clear();
        self.output_queue.clear();
    }

    /// Frames between a source frame and its rendered counterpart
    pub fn latency(&self) -> usize {
        self.stages.iter().map(|stage| stage.latency).sum()
    }

    /// Clamp applied to every output sample after the chain
    pub fn set_distortion(&mut self, distortion: Option<Distortion>) {
        self.distortion = distortion;
    }

    pub fn distortion(&self) -> Option<&Distortion> {
        self.distortion.as_ref()
    }

    /// The source is exhausted. Up to `latency()` frames of effect output
    /// may still be queued.
    pub fn is_finished(&self) -> bool {
        self.source.is_finished()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Pull `frame_count` frames from the source and return the next
    /// `frame_count` rendered frames
    ///
    /// Frames the source could not supply are rendered as silence, so
    /// queued effect output keeps flushing after a one-shot source ends.
    pub fn render(&mut self, frame_count: usize) -> SonanceResult<AudioBuffer> {
        let format = self.source.format();
        let mut block = AudioBuffer::new(frame_count, format);
        let supplied = self.source.fill(&mut block);
        log::trace!("render {frame_count} frames, source supplied {supplied}");

        for stage in &mut self.stages {
            block = stage.process(block)?;
        }
        self.output_queue.extend_from_slice(block.as_interleaved());

        // Stages hold back at most their latency, and the queue was primed
        // with the sum
        let needed = frame_count * format.channel_count();
        if self.output_queue.len() < needed {
            self.output_queue.resize(needed, 0.0);
        }
        let emitted: Vec<Sample> = self.output_queue.drain(..needed).collect();
        let mut output = AudioBuffer::from_interleaved(emitted, format)?;

        if let Some(distortion) = &mut self.distortion {
            distortion.process_block(output.as_interleaved_mut());
        }

        self.frames_rendered += frame_count as u64;
        Ok(output)
    }

    /// Rewind the source and clear all effect state
    pub fn reset(&mut self) {
        self.source.reset();
        for stage in &mut self.stages {
            stage.reset();
        }
        let silence = self.latency() * self.source.format().channel_count();
        self.output_queue.clear();
        self.output_queue.resize(silence, 0.0);
        if let Some(distortion) = &mut self.distortion {
            distortion.reset();
        }
        self.frames_rendered = 0;
    }
}
