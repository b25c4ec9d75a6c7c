use crate::{
    dsp::oscillator::Waveform,
    graph::{GainNode, GraphNode, OscNode, RenderCtx},
    patch::Patch,
    MAX_BLOCK_SIZE,
};

/*
LFO Routing
===========

Every voice owns ONE LFO, started with the voice, so two notes never share a
phase. Its output is split into two depth-scaled copies:

                      ┌── × filter depth (Hz) ──→ filter cutoff input
  LFO (rate, shape) ──┤
                      └── × tremolo depth ──────→ tremolo gain input

  filter depth  = lfo_depth × 2000 Hz   when lfo_filter_mod, else 0
  tremolo depth = lfo_depth × 0.5       when lfo_amp_mod,    else 0

The tremolo gain sits at 1.0 and the scaled LFO is summed into it, so at full
depth the level swings between 0.5 and 1.5.

Depths, rate and shape follow every patch update (smoothed); routing is
recomputed from the patch each time, never cached separately.
*/

/// Full-depth LFO swing on the filter cutoff, in Hz.
pub const LFO_FILTER_RANGE_HZ: f32 = 2000.0;
/// Full-depth LFO swing on the amplitude (half the level).
pub const LFO_TREMOLO_RANGE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationDepths {
    /// Peak cutoff deviation in Hz.
    pub filter_hz: f32,
    /// Peak deviation of the tremolo gain around 1.0.
    pub tremolo: f32,
}

impl ModulationDepths {
    pub fn from_patch(patch: &Patch) -> Self {
        Self {
            filter_hz: if patch.lfo_filter_mod {
                patch.lfo_depth * LFO_FILTER_RANGE_HZ
            } else {
                0.0
            },
            tremolo: if patch.lfo_amp_mod {
                patch.lfo_depth * LFO_TREMOLO_RANGE
            } else {
                0.0
            },
        }
    }
}

/// One voice's LFO and its two depth stages.
pub struct ModulationRouter {
    lfo: OscNode,
    filter_depth: GainNode,
    tremolo_depth: GainNode,
}

impl ModulationRouter {
    pub fn new(patch: &Patch, start: f64) -> Self {
        let depths = ModulationDepths::from_patch(patch);
        let mut lfo = OscNode::new(patch.lfo_waveform, patch.lfo_rate);
        lfo.start(start);

        Self {
            lfo,
            filter_depth: GainNode::new(depths.filter_hz),
            tremolo_depth: GainNode::new(depths.tremolo),
        }
    }

    /// Glide rate and depths to the patch over `time_constant`; shape switches at once.
    pub fn apply_patch(&mut self, patch: &Patch, now: f64, time_constant: f64) {
        let depths = ModulationDepths::from_patch(patch);

        if self.lfo.waveform() != patch.lfo_waveform {
            self.lfo.set_waveform(patch.lfo_waveform);
        }
        self.lfo
            .frequency
            .set_target_at_time(patch.lfo_rate, now, time_constant);
        self.filter_depth
            .gain
            .set_target_at_time(depths.filter_hz, now, time_constant);
        self.tremolo_depth
            .gain
            .set_target_at_time(depths.tremolo, now, time_constant);
    }

    pub fn stop(&mut self, at: f64) {
        self.lfo.stop(at);
    }

    /// Render the filter-cutoff modulation (Hz) and tremolo modulation.
    pub fn render(&mut self, filter_out: &mut [f32], tremolo_out: &mut [f32], ctx: &RenderCtx) {
        let len = filter_out.len().min(tremolo_out.len()).min(MAX_BLOCK_SIZE);
        let (filter_out, tremolo_out) = (&mut filter_out[..len], &mut tremolo_out[..len]);

        self.lfo.render_block(filter_out, ctx);
        tremolo_out.copy_from_slice(filter_out);

        self.filter_depth.render_block(filter_out, ctx);
        self.tremolo_depth.render_block(tremolo_out, ctx);
    }

    pub fn waveform(&self) -> Waveform {
        self.lfo.waveform()
    }

    pub fn rate_at(&self, time: f64) -> f32 {
        self.lfo.frequency.value_at(time)
    }

    pub fn depths_at(&self, time: f64) -> ModulationDepths {
        ModulationDepths {
            filter_hz: self.filter_depth.gain.value_at(time),
            tremolo: self.tremolo_depth.gain.value_at(time),
        }
    }

    pub fn prune(&mut self, before: f64) {
        self.lfo.prune(before);
        self.filter_depth.prune(before);
        self.tremolo_depth.prune(before);
    }
}
