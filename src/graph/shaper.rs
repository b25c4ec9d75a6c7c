use crate::{
    dsp::distortion::{shape_buffer, soft_clip_curve, CURVE_SIZE},
    graph::node::{GraphNode, RenderCtx},
};

/// Fixed-curve waveshaper.
///
/// The curve is built once from the drive amount and never changes; how much
/// of the shaped signal is heard is decided downstream by the mix bus.
pub struct WaveShaperNode {
    curve: Vec<f32>,
}

impl WaveShaperNode {
    pub fn soft_clip(drive: f32) -> Self {
        Self {
            curve: soft_clip_curve(drive, CURVE_SIZE),
        }
    }

    pub fn curve(&self) -> &[f32] {
        &self.curve
    }
}

impl GraphNode for WaveShaperNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        shape_buffer(&self.curve, out);
    }
}
