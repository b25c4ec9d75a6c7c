// Purpose: per-note voices, polyphony, LFO routing and the output bus
// This layer sits above graph nodes and owns every sounding note

pub mod mix_bus;
pub mod modulation;
pub mod voice;
pub mod voice_manager;

pub use mix_bus::MixBus;
pub use modulation::{ModulationDepths, ModulationRouter};
pub use voice::{Voice, VoiceState};
pub use voice_manager::{VoiceHandle, VoiceManager};
