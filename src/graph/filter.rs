use crate::{
    dsp::{automation::AutomationParam, filter::SVFilter},
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Lowpass Filter Node
===================

A filter removes or attenuates frequencies from a signal. In subtractive
synthesis you start with a harmonically rich waveform (a sawtooth) and filter
harmonics away to sculpt the timbre.

Parameters:
-----------

Cutoff (Hz): where the filter takes effect.
  - 200 Hz:    Muffled, like through a wall
  - 1000 Hz:   Warm, round
  - 5000 Hz:   Present, clear

Resonance (dB): emphasis at the cutoff.
  - 0 dB:   gentle rolloff
  - 6 dB:   audible peak
  - 15 dB:  aggressive, squelchy

Modulated cutoff
----------------

Both parameters are automation timelines. On top of that, the cutoff accepts
a per-sample modulation signal that is SUMMED with the timeline:

  cutoff[n] = cutoff(t_n) + mod[n]

A voice feeds its filter envelope (scaled to Hz) and its LFO (scaled to Hz)
into that input. Editing the base cutoff moves the whole sweep up or down
without restarting the envelope.

Coefficients are recomputed every sample; the damping term only when the
resonance actually changes.
*/

pub struct FilterNode {
    filter: SVFilter,
    pub cutoff: AutomationParam,
    pub resonance: AutomationParam,
    cutoff_buffer: Vec<f32>,
    resonance_buffer: Vec<f32>,
}

impl FilterNode {
    pub fn lowpass(cutoff_hz: f32, resonance_db: f32) -> Self {
        Self {
            filter: SVFilter::lowpass(),
            cutoff: AutomationParam::new(cutoff_hz),
            resonance: AutomationParam::new(resonance_db).with_range(0.0, f32::MAX),
            cutoff_buffer: vec![0.0; MAX_BLOCK_SIZE],
            resonance_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Filter `out` in place with `cutoff_mod` (Hz) added to the cutoff.
    pub fn render_modulated(&mut self, out: &mut [f32], cutoff_mod: &[f32], ctx: &RenderCtx) {
        let len = out.len().min(self.cutoff_buffer.len());
        let cutoffs = &mut self.cutoff_buffer[..len];
        let resonances = &mut self.resonance_buffer[..len];
        self.cutoff.render(cutoffs, ctx);
        self.resonance.render(resonances, ctx);

        for (cutoff, m) in cutoffs.iter_mut().zip(cutoff_mod.iter()) {
            *cutoff += *m;
        }

        run_filter(&mut self.filter, out, cutoffs, resonances, ctx.sample_rate);
    }
}

fn run_filter(filter: &mut SVFilter, out: &mut [f32], cutoffs: &[f32], resonances: &[f32], sample_rate: f32) {
    let mut last_resonance = f32::NAN;
    let mut k = 0.0;
    for ((sample, cutoff), resonance) in out.iter_mut().zip(cutoffs.iter()).zip(resonances.iter()) {
        if *resonance != last_resonance {
            last_resonance = *resonance;
            k = SVFilter::compute_k(last_resonance);
        }
        let g = SVFilter::compute_g(*cutoff, sample_rate);
        *sample = filter.next_sample(*sample, k, g);
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(self.cutoff_buffer.len());
        let cutoffs = &mut self.cutoff_buffer[..len];
        let resonances = &mut self.resonance_buffer[..len];
        self.cutoff.render(cutoffs, ctx);
        self.resonance.render(resonances, ctx);

        run_filter(&mut self.filter, out, cutoffs, resonances, ctx.sample_rate);
    }

    fn prune(&mut self, before: f64) {
        self.cutoff.prune(before);
        self.resonance.prune(before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{OscillatorBlock, Waveform};

    const SAMPLE_RATE: f32 = 48_000.0;

    fn saw(len: usize, frequency: f32) -> Vec<f32> {
        let mut osc = OscillatorBlock::new(Waveform::Sawtooth);
        let mut buffer = vec![0.0; len];
        osc.render(&mut buffer, frequency, SAMPLE_RATE);
        buffer
    }

    fn energy(buffer: &[f32]) -> f32 {
        buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32
    }

    #[test]
    fn modulation_opens_the_filter() {
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

        // Fundamental well above the closed cutoff, well below the opened one
        let mut closed = saw(MAX_BLOCK_SIZE, 1_000.0);
        FilterNode::lowpass(200.0, 0.0).render_modulated(&mut closed, &[0.0; MAX_BLOCK_SIZE], &ctx);

        let mut opened = saw(MAX_BLOCK_SIZE, 1_000.0);
        FilterNode::lowpass(200.0, 0.0).render_modulated(&mut opened, &[4_000.0; MAX_BLOCK_SIZE], &ctx);

        assert!(energy(&opened) > energy(&closed) * 4.0);
    }

    #[test]
    fn unmodulated_render_matches_zero_modulation() {
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

        let mut a = saw(512, 220.0);
        let mut b = a.clone();
        FilterNode::lowpass(1_000.0, 6.0).render_block(&mut a, &ctx);
        FilterNode::lowpass(1_000.0, 6.0).render_modulated(&mut b, &[0.0; 512], &ctx);

        assert_eq!(a, b);
    }

    #[test]
    fn negative_modulation_stays_stable() {
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);
        let mut buffer = saw(1024, 220.0);
        FilterNode::lowpass(500.0, 15.0).render_modulated(&mut buffer, &[-5_000.0; 1024], &ctx);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
