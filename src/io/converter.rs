use crate::{
    io::midi::MidiEvent,
    sequencing::notes::{midi_to_freq, note_name},
};

/// A note gesture, named and tuned, ready for the engine or the recorder.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteAction {
    On { name: String, frequency: f32, key: u8 },
    Off { name: String, key: u8 },
}

/// Turn note messages into note actions; everything else is `None`.
pub fn note_action(event: MidiEvent) -> Option<NoteAction> {
    match event {
        MidiEvent::NoteOn { key, .. } => Some(NoteAction::On {
            name: note_name(key),
            frequency: midi_to_freq(key),
            key,
        }),
        MidiEvent::NoteOff { key, .. } => Some(NoteAction::Off {
            name: note_name(key),
            key,
        }),
        _ => None,
    }
}
