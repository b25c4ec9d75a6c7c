// Purpose - device input decoding: MIDI bytes, controller maps, computer keys

pub mod controller;
pub mod converter;
pub mod keyboard;
pub mod midi;
pub mod panel;

pub use controller::{ControlAction, ControlMapper, CutoffRange};
pub use converter::{note_action, NoteAction};
pub use keyboard::{key_to_midi, key_to_note, KeyboardKey, KeyboardLayout};
pub use midi::MidiEvent;
pub use panel::PanelEdit;
