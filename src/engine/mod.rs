//! The engine context.
//!
//! `SynthEngine` is built once by the application and shared (behind a lock)
//! between the control thread and the audio callback. It owns the audio
//! clock, the current patch snapshot, the voices and the mix bus. Nothing in
//! here is global: two engines are fully independent.

pub mod allocator;
pub mod scheduler;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    dsp::distortion::DEFAULT_DRIVE,
    error::Result,
    graph::AudioClock,
    patch::{Patch, PatchUpdate},
    synth::{MixBus, VoiceHandle, VoiceManager},
    MAX_BLOCK_SIZE,
};

use self::allocator::VoiceAllocator;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub max_voices: usize,
    /// Output level after the mix bus.
    pub master_gain: f32,
    /// Drive of the fixed distortion curve.
    pub distortion_drive: f32,
    /// Time constant for patch edits on sounding voices, in seconds.
    pub voice_smoothing: f64,
    /// Time constant for dry/wet changes on the mix bus, in seconds.
    pub bus_smoothing: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 32,
            master_gain: 0.3,
            distortion_drive: DEFAULT_DRIVE,
            voice_smoothing: 0.05,
            bus_smoothing: 0.02,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }
}

/// Whether the audio device is actually pulling samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputState {
    #[default]
    Running,
    /// Output is not running; triggers still schedule but nothing is heard.
    Suspended,
}

pub struct SynthEngine {
    config: EngineConfig,
    clock: AudioClock,
    patch: Arc<Patch>,
    voices: VoiceManager,
    mix: MixBus,
    bus: Vec<f32>,
    output_state: OutputState,
    resume_requested: bool,
}

impl SynthEngine {
    pub fn new(config: EngineConfig) -> Self {
        let patch = Arc::new(Patch::default());
        let mix = MixBus::new(
            patch.distortion,
            config.distortion_drive,
            config.master_gain,
            config.bus_smoothing,
        );

        debug!(
            sample_rate = config.sample_rate,
            max_voices = config.max_voices,
            "engine created"
        );

        Self {
            clock: AudioClock::new(config.sample_rate),
            voices: VoiceManager::new(config.max_voices, config.voice_smoothing),
            mix,
            patch,
            bus: vec![0.0; MAX_BLOCK_SIZE],
            output_state: OutputState::Running,
            resume_requested: false,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current audio-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    /// The current patch snapshot. Never mutated; updates replace it.
    pub fn params(&self) -> Arc<Patch> {
        Arc::clone(&self.patch)
    }

    /// Merge `update` into a new snapshot and push it to the voices and the bus.
    pub fn update_params(&mut self, update: PatchUpdate) {
        if update.is_empty() {
            return;
        }
        let now = self.now();
        let patch = Arc::new(self.patch.merged(&update));

        self.mix.set_distortion(patch.distortion, now);
        self.voices.apply_model_update(&patch, now);
        self.patch = patch;

        trace!(?update, "patch updated");
    }

    /// Replace the whole patch.
    pub fn set_params(&mut self, patch: Patch) {
        let now = self.now();
        let patch = Arc::new(patch.clamped());
        self.mix.set_distortion(patch.distortion, now);
        self.voices.apply_model_update(&patch, now);
        self.patch = patch;
    }

    pub fn trigger(&mut self, frequency: f32) -> Result<VoiceHandle> {
        let now = self.now();
        self.trigger_at(frequency, now)
    }

    pub fn trigger_at(&mut self, frequency: f32, at: f64) -> Result<VoiceHandle> {
        self.note_resume_request();
        let at = at.max(self.now());
        self.voices.trigger_at(frequency, &self.patch, at)
    }

    /// Trigger by note name; a note that is already held is ignored.
    pub fn trigger_note(&mut self, name: &str, frequency: f32) -> Result<Option<VoiceHandle>> {
        self.note_resume_request();
        let now = self.now();
        self.voices.trigger_note(name, frequency, &self.patch, now)
    }

    pub fn release(&mut self, handle: VoiceHandle) -> bool {
        let now = self.now();
        self.voices.release_at(handle, now, now)
    }

    pub fn release_at(&mut self, handle: VoiceHandle, at: f64) -> bool {
        let now = self.now();
        self.voices.release_at(handle, at, now)
    }

    pub fn release_note(&mut self, name: &str) -> bool {
        let now = self.now();
        self.voices.release_note(name, now)
    }

    pub fn release_all(&mut self) {
        let now = self.now();
        self.voices.release_all(now);
    }

    pub fn cancel(&mut self, handle: VoiceHandle) -> bool {
        self.voices.cancel(handle)
    }

    /// Render mono output into `out`, advancing the clock by `out.len()` frames.
    pub fn render_block(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let ctx = self.clock.block_ctx();
            let bus = &mut self.bus[..chunk.len()];

            bus.fill(0.0);
            self.voices.render(bus, &ctx);
            self.mix.render(bus, &ctx);
            chunk.copy_from_slice(bus);

            self.clock.advance(chunk.len());
        }

        let now = self.now();
        self.voices.collect_retired(now);
        self.voices.prune(now);
        self.mix.prune(now);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn mix_bus(&self) -> &MixBus {
        &self.mix
    }

    pub fn output_state(&self) -> OutputState {
        self.output_state
    }

    pub fn set_output_state(&mut self, state: OutputState) {
        if self.output_state != state {
            debug!(?state, "output state changed");
        }
        self.output_state = state;
        if state == OutputState::Running {
            self.resume_requested = false;
        }
    }

    /// Whether a trigger asked for the output to be resumed since the last call.
    pub fn take_resume_request(&mut self) -> bool {
        std::mem::take(&mut self.resume_requested)
    }

    fn note_resume_request(&mut self) {
        if self.output_state == OutputState::Suspended {
            self.resume_requested = true;
        }
    }
}

impl Default for SynthEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl VoiceAllocator for SynthEngine {
    fn now(&self) -> f64 {
        SynthEngine::now(self)
    }

    fn trigger_at(&mut self, frequency: f32, at: f64) -> Result<VoiceHandle> {
        SynthEngine::trigger_at(self, frequency, at)
    }

    fn release_at(&mut self, handle: VoiceHandle, at: f64) -> bool {
        SynthEngine::release_at(self, handle, at)
    }

    fn cancel(&mut self, handle: VoiceHandle) -> bool {
        SynthEngine::cancel(self, handle)
    }
}
