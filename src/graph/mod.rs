//! Composable building blocks for a voice's signal graph.
//!
//! Graph nodes wrap the low-level DSP primitives with what a voice needs:
//! parameters as automation timelines on the shared audio clock, scheduled
//! start/stop, per-sample modulation inputs, and block-based rendering.

/// Constant-value source (envelope offsets as signals).
pub mod constant;
/// Lowpass filter with automated cutoff/resonance and a cutoff modulation input.
pub mod filter;
/// Automated gain stage with an optional additive modulation input.
pub mod gain;
/// Core traits shared by all graph nodes, plus the audio clock.
pub mod node;
/// Scheduled oscillators (audio-band and LFO).
pub mod oscillator;
/// Fixed-curve waveshaper.
pub mod shaper;

pub use constant::ConstantSource;
pub use filter::FilterNode;
pub use gain::GainNode;
pub use node::{AudioClock, GraphNode, RenderCtx};
pub use oscillator::OscNode;
pub use shaper::WaveShaperNode;
