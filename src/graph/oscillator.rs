use crate::{
    dsp::{
        automation::AutomationParam,
        oscillator::{OscillatorBlock, Waveform},
    },
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Oscillator Node
===============

A scheduled tone generator: an `OscillatorBlock` whose frequency is an
automation timeline, switched on at `start` and off at `stop`.

   silent         sounding                silent
  ─────────┬──────────────────────────┬─────────→ time
         start                       stop

Outside that window the node writes zeros and does not advance its phase.
A stop time is final; the node is not restarted, a new voice gets a new node.

The same node serves as the per-voice LFO: same shapes, a few Hz instead of a
few hundred.

Example usage:
  let mut osc = OscNode::new(Waveform::Sawtooth, 261.63);
  osc.start(now);
  osc.stop(now + 0.52);
*/

pub struct OscNode {
    osc: OscillatorBlock,
    pub frequency: AutomationParam,
    start: f64,
    stop: Option<f64>,
    freq_buffer: Vec<f32>,
}

impl OscNode {
    pub fn new(waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency: AutomationParam::new(frequency_hz).with_range(0.0, f32::MAX),
            start: 0.0,
            stop: None,
            freq_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }

    /// Shape changes take effect immediately and keep the phase.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
    }

    pub fn start(&mut self, at: f64) {
        self.start = at;
    }

    /// Schedule the stop. Later calls move it; a stop never precedes the start.
    pub fn stop(&mut self, at: f64) {
        self.stop = Some(at.max(self.start));
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop
    }

}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(self.freq_buffer.len());
        let freqs = &mut self.freq_buffer[..len];
        self.frequency.render(freqs, ctx);

        let (start, stop) = (self.start, self.stop);
        for (i, (sample, freq)) in out.iter_mut().zip(freqs.iter()).enumerate() {
            let t = ctx.sample_time(i);
            *sample = if t >= start && stop.map_or(true, |s| t < s) {
                self.osc.next_sample(*freq, ctx.sample_rate)
            } else {
                0.0
            };
        }
    }

    fn prune(&mut self, before: f64) {
        self.frequency.prune(before);
    }
}
