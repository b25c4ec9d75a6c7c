use crate::{
    graph::{GainNode, GraphNode, RenderCtx, WaveShaperNode},
    MAX_BLOCK_SIZE,
};

/*
Mix Bus
=======

Every voice lands on one shared bus, which splits into two parallel paths:

                ┌─→ × (1 - distortion) ──────────────┐
  voices (Σ) ───┤                                    ├─→ × master ─→ out
                └─→ soft clip ─→ × distortion ───────┘

The shaping curve is fixed at construction. Only the dry/wet balance moves,
always through a short smoothing ramp so turning the knob never clicks.
*/

pub struct MixBus {
    dry: GainNode,
    wet: GainNode,
    shaper: WaveShaperNode,
    master_gain: f32,
    smoothing: f64,
    wet_buffer: Vec<f32>,
}

impl MixBus {
    pub fn new(distortion: f32, drive: f32, master_gain: f32, smoothing: f64) -> Self {
        let distortion = distortion.clamp(0.0, 1.0);
        Self {
            dry: GainNode::new(1.0 - distortion),
            wet: GainNode::new(distortion),
            shaper: WaveShaperNode::soft_clip(drive),
            master_gain,
            smoothing,
            wet_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Glide the dry/wet split to `distortion` starting at `now`.
    pub fn set_distortion(&mut self, distortion: f32, now: f64) {
        let distortion = distortion.clamp(0.0, 1.0);
        self.dry
            .gain
            .set_target_at_time(1.0 - distortion, now, self.smoothing);
        self.wet
            .gain
            .set_target_at_time(distortion, now, self.smoothing);
    }

    /// Mix the summed voices in `bus` down to the output, in place.
    pub fn render(&mut self, bus: &mut [f32], ctx: &RenderCtx) {
        let len = bus.len().min(self.wet_buffer.len());
        let bus = &mut bus[..len];
        let wet = &mut self.wet_buffer[..len];

        wet.copy_from_slice(bus);
        self.shaper.render_block(wet, ctx);
        self.wet.render_block(wet, ctx);
        self.dry.render_block(bus, ctx);

        for (out, w) in bus.iter_mut().zip(wet.iter()) {
            *out = (*out + *w) * self.master_gain;
        }
    }

    pub fn prune(&mut self, before: f64) {
        self.dry.prune(before);
        self.wet.prune(before);
    }

    pub fn dry_level_at(&self, time: f64) -> f32 {
        self.dry.gain.value_at(time)
    }

    pub fn wet_level_at(&self, time: f64) -> f32 {
        self.wet.gain.value_at(time)
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::distortion::{soft_clip, DEFAULT_DRIVE};

    #[test]
    fn dry_only_is_master_scaled_copy() {
        let mut bus = MixBus::new(0.0, DEFAULT_DRIVE, 0.3, 0.02);
        let mut samples = [0.5f32, -0.25, 1.0];
        bus.render(&mut samples, &RenderCtx::new(48_000.0, 0.0));

        assert_eq!(samples, [0.5 * 0.3, -0.25 * 0.3, 0.3]);
    }

    #[test]
    fn wet_only_is_shaped() {
        let mut bus = MixBus::new(1.0, DEFAULT_DRIVE, 1.0, 0.02);
        let mut samples = [0.5f32];
        bus.render(&mut samples, &RenderCtx::new(48_000.0, 0.0));

        assert!((samples[0] - soft_clip(0.5, DEFAULT_DRIVE)).abs() < 1e-3);
    }

    #[test]
    fn distortion_change_is_smoothed() {
        let mut bus = MixBus::new(0.0, DEFAULT_DRIVE, 0.3, 0.02);
        bus.set_distortion(1.0, 1.0);

        assert_eq!(bus.wet_level_at(1.0), 0.0);
        let one_tau = bus.wet_level_at(1.02);
        assert!((one_tau - 0.632).abs() < 0.01);
        assert!(bus.dry_level_at(1.5) < 1e-6);
    }
}
