//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These components are allocation-free once constructed, making them safe to
//! embed directly inside voice structs. They stay focused on the
//! signal-processing math and the automation timeline; the graph layer wires
//! them into voices.

/// Sample-accurate parameter timelines (jumps, ramps, target approaches).
pub mod automation;
/// Soft-clip waveshaping curve.
pub mod distortion;
/// ADSR envelopes written as automation events.
pub mod envelope;
/// State-variable lowpass filter.
pub mod filter;
/// Oscillator waveforms.
pub mod oscillator;

pub use automation::AutomationParam;
pub use envelope::EnvelopeStage;
pub use oscillator::Waveform;
