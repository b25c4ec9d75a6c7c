pub mod dsp;
pub mod engine; // Engine context, voice allocation seam, look-ahead scheduling
pub mod error;
pub mod graph; // Block-rendering nodes driven by parameter automation
pub mod io;
pub mod patch; // The synthesis parameter model
pub mod sequencing; // Notes, the 16-step pattern and its sequencer
pub mod synth; // Voice management and polyphony

pub use engine::{EngineConfig, OutputState, SynthEngine};
pub use error::SynthError;
pub use patch::{Adsr, Patch, PatchUpdate};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
