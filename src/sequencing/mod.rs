pub mod notes;
pub mod pattern;
pub mod sequencer;

pub use notes::{midi_to_freq, note_name, parse_note_name};
pub use pattern::{Step, StepNote, StepPattern, STEP_COUNT};
pub use sequencer::{SequencerConfig, StepSequencer, TransportState};
