use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::{
    engine::{
        allocator::VoiceAllocator,
        scheduler::{LookaheadScheduler, DEFAULT_LOOKAHEAD},
    },
    sequencing::pattern::{StepNote, StepPattern, STEP_COUNT},
    synth::VoiceHandle,
};

/*
Step Sequencer
==============

Transport: Stopped or Playing. Recording is an independent flag.

  Stopped ──play──→ Playing ──stop──→ Stopped
     ↑ select/toggle      │ tick: schedule steps ahead on the audio clock
     │ step entry         │ live recording onto the sounding step

Two positions are tracked:

  current step   What the grid shows. While playing: the step sounding now.
                 While stopped: the selected step (toggle and arrows move it,
                 step entry writes here and advances it).

  cursor         Where playback resumes. Set from the current step when
                 playback stops, so selecting steps while stopped does not
                 move the resume point.

Timing
------

Sixteenth notes: interval = 60 / bpm / 4 seconds. Each active step triggers a
voice at its exact start time and releases it after 80% of the interval, a
short gate independent of the patch's release tail.

Steps are scheduled up to a look-ahead window in advance, so `tick` only has
to be called every few tens of milliseconds. Steps that were scheduled but
have not started when playback stops are cancelled.

Recording
---------

  Recording + Playing   note overwrites the CURRENT step (live, quantized)
  Recording + Stopped   note overwrites the current step, selection moves on
*/

pub const MIN_BPM: f32 = 30.0;
pub const MAX_BPM: f32 = 300.0;
pub const DEFAULT_BPM: f32 = 120.0;
/// Fraction of a step the gate stays open.
pub const GATE_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerConfig {
    pub bpm: f32,
    /// Seconds of audio scheduled ahead on every tick.
    pub lookahead: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
}

/// A step handed to the engine but possibly not reached yet.
#[derive(Debug, Clone, Copy)]
struct PendingStep {
    index: usize,
    time: f64,
    voice: Option<VoiceHandle>,
}

pub struct StepSequencer {
    pattern: StepPattern,
    bpm: f32,
    transport: TransportState,
    recording: bool,
    current_step: usize,
    cursor: usize,
    scheduler: LookaheadScheduler,
    pending: VecDeque<PendingStep>,
}

impl StepSequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            pattern: StepPattern::new(),
            bpm: config.bpm.clamp(MIN_BPM, MAX_BPM),
            transport: TransportState::Stopped,
            recording: false,
            current_step: 0,
            cursor: 0,
            scheduler: LookaheadScheduler::new(STEP_COUNT, config.lookahead),
            pending: VecDeque::with_capacity(STEP_COUNT),
        }
    }

    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    pub fn nudge_bpm(&mut self, delta: f32) {
        self.set_bpm(self.bpm + delta);
    }

    /// Length of one sixteenth note in seconds.
    pub fn step_interval(&self) -> f64 {
        60.0 / self.bpm as f64 / 4.0
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn toggle_recording(&mut self) {
        self.recording = !self.recording;
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Where playback resumes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Start playback from the cursor at the current audio time.
    pub fn play(&mut self, now: f64) {
        if self.is_playing() {
            return;
        }
        self.transport = TransportState::Playing;
        self.scheduler.start(now, self.cursor);
        debug!(from = self.cursor, bpm = self.bpm, "sequencer playing");
    }

    /// Stop playback. Steps not yet reached are cancelled; the cursor moves to
    /// the step that was showing.
    pub fn stop<A: VoiceAllocator + ?Sized>(&mut self, allocator: &mut A) {
        if !self.is_playing() {
            return;
        }
        let now = allocator.now();
        self.advance_visible(now);

        for step in self.pending.drain(..) {
            if let Some(voice) = step.voice {
                allocator.cancel(voice);
            }
        }

        self.scheduler.stop();
        self.transport = TransportState::Stopped;
        self.cursor = self.current_step;
        debug!(cursor = self.cursor, "sequencer stopped");
    }

    pub fn toggle_playback<A: VoiceAllocator + ?Sized>(&mut self, allocator: &mut A) {
        if self.is_playing() {
            self.stop(allocator);
        } else {
            let now = allocator.now();
            self.play(now);
        }
    }

    /// Schedule every step due within the look-ahead window and move the
    /// visible step. Call this regularly from the control thread.
    ///
    /// Returns the number of steps scheduled.
    pub fn tick<A: VoiceAllocator + ?Sized>(&mut self, allocator: &mut A) -> usize {
        if !self.is_playing() {
            return 0;
        }
        let now = allocator.now();
        let interval = self.step_interval();
        let mut scheduled = 0;

        while let Some(due) = self.scheduler.next_due(now, interval) {
            let voice = match self.pattern.get(due.index).playable() {
                Some(note) => match allocator.trigger_at(note.frequency, due.time) {
                    Ok(handle) => {
                        allocator.release_at(handle, due.time + interval * GATE_FRACTION);
                        Some(handle)
                    }
                    Err(err) => {
                        warn!(step = due.index, %err, "step dropped");
                        None
                    }
                },
                None => None,
            };

            trace!(step = due.index, time = due.time, sounding = voice.is_some(), "step scheduled");
            self.pending.push_back(PendingStep {
                index: due.index,
                time: due.time,
                voice,
            });
            scheduled += 1;
        }

        self.advance_visible(now);
        scheduled
    }

    fn advance_visible(&mut self, now: f64) {
        while let Some(step) = self.pending.front() {
            if step.time > now {
                break;
            }
            self.current_step = step.index;
            self.pending.pop_front();
        }
    }

    /// Select a step for editing.
    pub fn select_step(&mut self, index: usize) {
        self.current_step = index % STEP_COUNT;
    }

    pub fn select_next(&mut self) {
        self.select_step(self.current_step + 1);
    }

    pub fn select_previous(&mut self) {
        self.select_step(self.current_step + STEP_COUNT - 1);
    }

    /// Toggle a step and select it.
    pub fn toggle_step(&mut self, index: usize) {
        let index = index % STEP_COUNT;
        self.pattern.toggle(index);
        self.current_step = index;
    }

    /// Feed a played note to the recorder. Returns the step written, if any.
    pub fn record_note(&mut self, note: StepNote) -> Option<usize> {
        if !self.recording {
            return None;
        }

        let index = self.current_step;
        trace!(step = index, note = %note.name, live = self.is_playing(), "note recorded");
        self.pattern.set_note(index, note);
        if !self.is_playing() {
            self.current_step = (index + 1) % STEP_COUNT;
        }
        Some(index)
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pattern.randomize(rng);
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    pub fn pattern_mut(&mut self) -> &mut StepPattern {
        &mut self.pattern
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}
