use crate::{
    dsp::{
        envelope::{
            schedule_amp_release, schedule_attack_decay, schedule_release, stage_at, EnvelopeStage,
            FILTER_RELEASE_FLOOR,
        },
        oscillator::Waveform,
    },
    graph::{ConstantSource, FilterNode, GainNode, GraphNode, OscNode, RenderCtx},
    patch::{Adsr, Patch},
    synth::modulation::{ModulationDepths, ModulationRouter},
    MAX_BLOCK_SIZE,
};

/*
Voice Graph
===========

One note, one private signal graph:

  osc1 ─→ × (1 - mix) ─┐
                       ├─→ lowpass ─→ × amp env ─→ × tremolo ─→ out
  osc2 ─→ × mix ───────┘       ↑                      ↑
                               │                      │
  filter env ─→ × 2000 Hz ─────┤                      │
                               │                      │
  LFO ─┬─→ × filter depth ─────┘                      │
       └─→ × tremolo depth ───────────────────────────┘

The filter's own cutoff parameter is the BASE cutoff from the patch; the
envelope and LFO paths are summed on top of it. A patch edit therefore moves
the base without touching the envelope shape.

Envelope parameters are captured at trigger time. Patch updates retarget
steady-state values (cutoff, resonance, mix, waveforms, LFO) but never the
amp gain or the filter envelope offset; those belong to the envelope, and a
release always wins.

Timeline
--------

  start           release               silent      stop       retire
    │ A │ D │ S ... │ R (exp to 1e-4) ─────│ 10 ms │  │ +30 ms │
    ├───────────────┼──────────────────────┼───────┼──┼────────┼──→ time
                                            amp = 0  oscillators
                                                     and LFO off

  stop   = release + amp release + 20 ms
  retire = stop + 30 ms
*/

/// Peak filter envelope sweep in Hz.
pub const FILTER_ENV_AMOUNT_HZ: f32 = 2000.0;
/// Oscillators stop this long after the amplitude release ends.
pub const STOP_GUARD: f64 = 0.02;
/// A stopped voice is retired this long after its stop time.
pub const RETIRE_DELAY: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Scheduled,  // Start time not reached yet
    Sustaining, // Attack, decay or sustain
    Releasing,  // Release ramp or tail
    Stopped,    // Oscillators off, waiting for retirement
}

struct VoiceBuffers {
    osc2: Vec<f32>,
    cutoff_mod: Vec<f32>,
    lfo_cutoff: Vec<f32>,
    tremolo: Vec<f32>,
}

impl VoiceBuffers {
    fn new() -> Self {
        Self {
            osc2: vec![0.0; MAX_BLOCK_SIZE],
            cutoff_mod: vec![0.0; MAX_BLOCK_SIZE],
            lfo_cutoff: vec![0.0; MAX_BLOCK_SIZE],
            tremolo: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

pub struct Voice {
    frequency: f32,
    start: f64,
    amp_adsr: Adsr,
    filter_adsr: Adsr,
    released_at: Option<f64>,
    stop_at: Option<f64>,
    retire_at: Option<f64>,

    osc1: OscNode,
    osc2: OscNode,
    osc1_gain: GainNode,
    osc2_gain: GainNode,
    filter: FilterNode,
    filter_env: ConstantSource,
    filter_env_amount: GainNode,
    amp: GainNode,
    tremolo: GainNode,
    modulation: ModulationRouter,

    buffers: VoiceBuffers,
}

impl Voice {
    /// Build the graph for `frequency` (already octave-shifted) and schedule
    /// attack and decay from `start`.
    pub fn new(frequency: f32, patch: &Patch, start: f64) -> Self {
        let mut osc1 = OscNode::new(patch.osc1_waveform, frequency);
        let mut osc2 = OscNode::new(patch.osc2_waveform, frequency);
        osc1.start(start);
        osc2.start(start);

        let mut amp = GainNode::new(0.0);
        schedule_attack_decay(&mut amp.gain, &patch.amp_adsr, start);

        let mut filter_env = ConstantSource::new(0.0);
        schedule_attack_decay(&mut filter_env.offset, &patch.filter_adsr, start);

        Self {
            frequency,
            start,
            amp_adsr: patch.amp_adsr,
            filter_adsr: patch.filter_adsr,
            released_at: None,
            stop_at: None,
            retire_at: None,
            osc1,
            osc2,
            osc1_gain: GainNode::new(1.0 - patch.osc_mix),
            osc2_gain: GainNode::new(patch.osc_mix),
            filter: FilterNode::lowpass(patch.filter_cutoff, patch.filter_resonance),
            filter_env,
            filter_env_amount: GainNode::new(FILTER_ENV_AMOUNT_HZ),
            amp,
            tremolo: GainNode::new(1.0),
            modulation: ModulationRouter::new(patch, start),
            buffers: VoiceBuffers::new(),
        }
    }

    /// Schedule the release at `at`. Returns `false` if already released.
    ///
    /// Pending envelope automation is cancelled first, so the release ramps
    /// start from wherever the envelopes are at `at`.
    pub fn release(&mut self, at: f64) -> bool {
        if self.released_at.is_some() {
            return false;
        }
        let at = at.max(self.start);

        let silent = schedule_amp_release(&mut self.amp.gain, self.amp_adsr.release, at);
        schedule_release(
            &mut self.filter_env.offset,
            self.filter_adsr.release,
            FILTER_RELEASE_FLOOR,
            at,
        );

        let stop = at + self.amp_adsr.release as f64 + STOP_GUARD;
        debug_assert!(stop >= silent);
        self.osc1.stop(stop);
        self.osc2.stop(stop);
        self.filter_env.stop(stop);
        self.modulation.stop(stop);

        self.released_at = Some(at);
        self.stop_at = Some(stop);
        self.retire_at = Some(stop + RETIRE_DELAY);
        true
    }

    /// Push the patch's steady-state targets with a smoothing ramp.
    pub fn apply_patch(&mut self, patch: &Patch, now: f64, time_constant: f64) {
        self.filter
            .cutoff
            .set_target_at_time(patch.filter_cutoff, now, time_constant);
        self.filter
            .resonance
            .set_target_at_time(patch.filter_resonance, now, time_constant);

        self.osc1_gain
            .gain
            .set_target_at_time(1.0 - patch.osc_mix, now, time_constant);
        self.osc2_gain
            .gain
            .set_target_at_time(patch.osc_mix, now, time_constant);

        if self.osc1.waveform() != patch.osc1_waveform {
            self.osc1.set_waveform(patch.osc1_waveform);
        }
        if self.osc2.waveform() != patch.osc2_waveform {
            self.osc2.set_waveform(patch.osc2_waveform);
        }

        self.modulation.apply_patch(patch, now, time_constant);
    }

    /// Render this voice into `out`, overwriting it.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(MAX_BLOCK_SIZE);
        let out = &mut out[..len];
        let b = &mut self.buffers;
        let osc2 = &mut b.osc2[..len];
        let cutoff_mod = &mut b.cutoff_mod[..len];
        let lfo_cutoff = &mut b.lfo_cutoff[..len];
        let tremolo = &mut b.tremolo[..len];

        // Oscillator mix
        self.osc1.render_block(out, ctx);
        self.osc1_gain.render_block(out, ctx);
        self.osc2.render_block(osc2, ctx);
        self.osc2_gain.render_block(osc2, ctx);
        for (o, s) in out.iter_mut().zip(osc2.iter()) {
            *o += *s;
        }

        // Cutoff modulation: envelope sweep plus LFO, both in Hz
        self.modulation.render(lfo_cutoff, tremolo, ctx);
        self.filter_env.render_block(cutoff_mod, ctx);
        self.filter_env_amount.render_block(cutoff_mod, ctx);
        for (c, l) in cutoff_mod.iter_mut().zip(lfo_cutoff.iter()) {
            *c += *l;
        }

        self.filter.render_modulated(out, cutoff_mod, ctx);
        self.amp.render_block(out, ctx);
        self.tremolo.render_modulated(out, tremolo, ctx);
    }

    pub fn prune(&mut self, before: f64) {
        self.osc1.prune(before);
        self.osc2.prune(before);
        self.osc1_gain.prune(before);
        self.osc2_gain.prune(before);
        self.filter.prune(before);
        self.filter_env.prune(before);
        self.amp.prune(before);
        self.modulation.prune(before);
    }

    pub fn state_at(&self, time: f64) -> VoiceState {
        if time < self.start {
            return VoiceState::Scheduled;
        }
        match (self.released_at, self.stop_at) {
            (_, Some(stop)) if time >= stop => VoiceState::Stopped,
            (Some(released), _) if time >= released => VoiceState::Releasing,
            _ => VoiceState::Sustaining,
        }
    }

    pub fn amp_stage_at(&self, time: f64) -> EnvelopeStage {
        stage_at(&self.amp_adsr, self.start, self.released_at, time)
    }

    pub fn is_retired(&self, now: f64) -> bool {
        self.retire_at.is_some_and(|retire| now >= retire)
    }

    pub fn is_released(&self) -> bool {
        self.released_at.is_some()
    }

    /// Frequency the oscillators were started at, after the octave shift.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn oscillator_frequencies_at(&self, time: f64) -> (f32, f32) {
        (
            self.osc1.frequency.value_at(time),
            self.osc2.frequency.value_at(time),
        )
    }

    pub fn waveforms(&self) -> (Waveform, Waveform) {
        (self.osc1.waveform(), self.osc2.waveform())
    }

    pub fn lfo_waveform(&self) -> Waveform {
        self.modulation.waveform()
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }

    pub fn released_at(&self) -> Option<f64> {
        self.released_at
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_at
    }

    pub fn retire_time(&self) -> Option<f64> {
        self.retire_at
    }

    pub fn amp_adsr(&self) -> Adsr {
        self.amp_adsr
    }

    pub fn amp_level_at(&self, time: f64) -> f32 {
        self.amp.gain.value_at(time)
    }

    /// Base cutoff (the patch value, smoothed), without envelope or LFO.
    pub fn base_cutoff_at(&self, time: f64) -> f32 {
        self.filter.cutoff.value_at(time)
    }

    /// Base cutoff plus the filter envelope sweep, without LFO.
    pub fn cutoff_at(&self, time: f64) -> f32 {
        self.base_cutoff_at(time) + self.filter_env.offset.value_at(time) * FILTER_ENV_AMOUNT_HZ
    }

    pub fn resonance_at(&self, time: f64) -> f32 {
        self.filter.resonance.value_at(time)
    }

    pub fn mix_at(&self, time: f64) -> (f32, f32) {
        (
            self.osc1_gain.gain.value_at(time),
            self.osc2_gain.gain.value_at(time),
        )
    }

    pub fn modulation_at(&self, time: f64) -> ModulationDepths {
        self.modulation.depths_at(time)
    }

    pub fn lfo_rate_at(&self, time: f64) -> f32 {
        self.modulation.rate_at(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    #[test]
    fn builds_graph_from_patch() {
        let patch = Patch::default();
        let voice = Voice::new(261.63, &patch, 0.0);

        assert_eq!(voice.oscillator_frequencies_at(0.0), (261.63, 261.63));
        assert_eq!(voice.waveforms(), (Waveform::Triangle, Waveform::Sawtooth));
        assert_eq!(voice.mix_at(0.0), (0.5, 0.5));
        assert_eq!(voice.resonance_at(0.0), patch.filter_resonance);
        assert_eq!(voice.state_at(0.0), VoiceState::Sustaining);
    }

    #[test]
    fn cutoff_envelope_rises_from_base() {
        let voice = Voice::new(261.63, &Patch::default(), 0.0);

        assert_eq!(voice.cutoff_at(0.0), 1000.0);
        // Filter attack is 50 ms
        assert!((voice.cutoff_at(0.05) - 3000.0).abs() < 1.0);
        // Settles at sustain 0.2 of the sweep
        assert!((voice.cutoff_at(2.0) - 1400.0).abs() < 1.0);
    }

    #[test]
    fn release_schedules_stop_and_retirement() {
        let mut voice = Voice::new(440.0, &Patch::default(), 0.0);
        assert_eq!(voice.amp_stage_at(0.005), EnvelopeStage::Attack);
        assert_eq!(voice.amp_stage_at(0.15), EnvelopeStage::Sustain);
        assert!(voice.release(0.2));
        assert!(!voice.release(0.3), "second release is a no-op");
        assert_eq!(voice.amp_stage_at(0.3), EnvelopeStage::Release);
        assert_eq!(voice.amp_stage_at(0.75), EnvelopeStage::Finished);

        let stop = 0.2 + 0.5 + STOP_GUARD;
        assert_eq!(voice.stop_time(), Some(stop));
        assert_eq!(voice.retire_time(), Some(stop + RETIRE_DELAY));
        assert_eq!(voice.amp_level_at(0.2 + 0.5 + 0.01), 0.0);
        assert_eq!(voice.state_at(0.3), VoiceState::Releasing);
        assert_eq!(voice.state_at(stop), VoiceState::Stopped);
        assert!(!voice.is_retired(stop));
        assert!(voice.is_retired(stop + RETIRE_DELAY));
    }

    #[test]
    fn patch_update_leaves_envelope_alone() {
        let mut voice = Voice::new(440.0, &Patch::default(), 0.0);
        voice.release(0.2);
        let level_before = voice.amp_level_at(0.4);

        let bright = Patch {
            filter_cutoff: 5000.0,
            osc_mix: 1.0,
            osc1_waveform: Waveform::Square,
            ..Patch::default()
        };
        voice.apply_patch(&bright, 0.3, 0.05);

        assert_eq!(voice.amp_level_at(0.4), level_before);
        assert!((voice.base_cutoff_at(1.0) - 5000.0).abs() < 1.0);
        assert_eq!(voice.waveforms().0, Waveform::Square);
        let (a, b) = voice.mix_at(1.0);
        assert!(a < 1e-3 && (b - 1.0).abs() < 1e-3);
    }

    #[test]
    fn renders_audio_then_silence() {
        let mut voice = Voice::new(220.0, &Patch::default(), 0.0);
        voice.release(0.05);

        let mut buffer = vec![0.0f32; 1024];
        let mut loud = 0.0f32;
        let mut frames = 0usize;
        while frames < SAMPLE_RATE as usize {
            let ctx = RenderCtx::new(SAMPLE_RATE, frames as f64 / SAMPLE_RATE as f64);
            voice.render(&mut buffer, &ctx);
            if frames < 2048 {
                loud = loud.max(peak(&buffer));
            }
            frames += buffer.len();
        }

        assert!(loud > 0.05, "voice should be audible early, peak {loud}");
        assert_eq!(peak(&buffer), 0.0, "voice should be silent after stop");
    }

    #[test]
    fn late_release_is_clamped_to_start() {
        let mut voice = Voice::new(220.0, &Patch::default(), 1.0);
        assert_eq!(voice.state_at(0.5), VoiceState::Scheduled);

        voice.release(0.5);
        assert_eq!(voice.released_at(), Some(1.0));
    }
}
