use crate::{
    dsp::automation::AutomationParam,
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Gain Stage
==========

Multiplies the signal passing through it by an automated gain.

  out[n] = in[n] · gain(t_n)

A gain stage can also take a modulation signal that is SUMMED into its gain
before the multiply, the way an audio-rate signal patched into a gain input
adds to the parameter's own value:

  out[n] = in[n] · (gain(t_n) + mod[n])

That is how tremolo works: a gain fixed at 1.0 with an LFO (scaled by the
tremolo depth) summed on top, so the level swings around unity.

The same stage doubles as a depth control: run the LFO through a gain of
`depth` and the output is the LFO scaled to that depth.
*/

pub struct GainNode {
    pub gain: AutomationParam,
    gain_buffer: Vec<f32>,
}

impl GainNode {
    pub fn new(gain: f32) -> Self {
        Self {
            gain: AutomationParam::new(gain),
            gain_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Apply `gain + modulation` sample by sample.
    pub fn render_modulated(&mut self, out: &mut [f32], modulation: &[f32], ctx: &RenderCtx) {
        let len = out.len().min(self.gain_buffer.len());
        let gains = &mut self.gain_buffer[..len];
        self.gain.render(gains, ctx);

        for ((sample, gain), m) in out.iter_mut().zip(gains.iter()).zip(modulation.iter()) {
            *sample *= *gain + *m;
        }
    }
}

impl GraphNode for GainNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(self.gain_buffer.len());
        let gains = &mut self.gain_buffer[..len];
        self.gain.render(gains, ctx);

        for (sample, gain) in out.iter_mut().zip(gains.iter()) {
            *sample *= *gain;
        }
    }

    fn prune(&mut self, before: f64) {
        self.gain.prune(before);
    }
}
