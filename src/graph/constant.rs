use crate::{
    dsp::automation::AutomationParam,
    graph::node::{GraphNode, RenderCtx},
};

/// A signal that is just its `offset` parameter.
///
/// Used to turn an envelope timeline into an audio-rate signal that can be
/// scaled and summed into another parameter (the filter envelope path).
pub struct ConstantSource {
    pub offset: AutomationParam,
    stop: Option<f64>,
}

impl ConstantSource {
    pub fn new(offset: f32) -> Self {
        Self {
            offset: AutomationParam::new(offset),
            stop: None,
        }
    }

    pub fn stop(&mut self, at: f64) {
        self.stop = Some(at);
    }
}

impl GraphNode for ConstantSource {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.offset.render(out, ctx);

        if let Some(stop) = self.stop {
            for (i, sample) in out.iter_mut().enumerate() {
                if ctx.sample_time(i) >= stop {
                    *sample = 0.0;
                }
            }
        }
    }

    fn prune(&mut self, before: f64) {
        self.offset.prune(before);
    }
}
