use crate::sequencing::notes::{midi_to_freq, note_name};

/*
Computer Keyboard
=================

Two rows of a QWERTY keyboard laid out like a piano, from C4:

   w   e       t   y   u       o   p
 a   s   d   f   g   h   j   k   l   ;

 a C4   w C#4  s D4   e D#4  d E4   f F4   t F#4  g G4
 y G#4  h A4   u A#4  j B4   k C5   o C#5  l D5   p D#5  ; E5
*/

/// MIDI number of the lowest computer key.
pub const COMPUTER_KEY_BASE: u8 = 60;

const COMPUTER_KEYS: [char; 17] = [
    'a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k', 'o', 'l', 'p', ';',
];

/// Octaves shown by the on-screen keyboard, plus the closing top note.
pub const LAYOUT_OCTAVES: u8 = 3;
pub const DEFAULT_START_OCTAVE: i8 = 3;

/// MIDI number for a computer key, if the key plays a note.
pub fn key_to_midi(key: char) -> Option<u8> {
    let key = key.to_ascii_lowercase();
    COMPUTER_KEYS
        .iter()
        .position(|&k| k == key)
        .map(|offset| COMPUTER_KEY_BASE + offset as u8)
}

/// Note name for a computer key, e.g. `'a'` → `"C4"`.
pub fn key_to_note(key: char) -> Option<String> {
    key_to_midi(key).map(note_name)
}

/// The computer key bound to a MIDI number, for labelling.
pub fn midi_to_key(midi: u8) -> Option<char> {
    let offset = midi.checked_sub(COMPUTER_KEY_BASE)? as usize;
    COMPUTER_KEYS.get(offset).copied()
}

#[inline]
pub fn is_black_key(midi: u8) -> bool {
    matches!(midi % 12, 1 | 3 | 6 | 8 | 10)
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardKey {
    pub name: String,
    pub midi: u8,
    pub frequency: f32,
    pub is_black: bool,
}

impl KeyboardKey {
    pub fn from_midi(midi: u8) -> Self {
        Self {
            name: note_name(midi),
            midi,
            frequency: midi_to_freq(midi),
            is_black: is_black_key(midi),
        }
    }
}

/// The on-screen keyboard: three octaves from C of `start_octave`, plus the
/// next C.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    start_octave: i8,
    keys: Vec<KeyboardKey>,
}

impl KeyboardLayout {
    pub fn new(start_octave: i8) -> Self {
        // Keep the whole range inside MIDI 0..=127.
        let start_octave = start_octave.clamp(-1, 6);
        let first = ((start_octave as i16 + 1) * 12) as u8;
        let count = LAYOUT_OCTAVES * 12 + 1;
        let keys = (first..first + count).map(KeyboardKey::from_midi).collect();

        Self { start_octave, keys }
    }

    pub fn start_octave(&self) -> i8 {
        self.start_octave
    }

    pub fn keys(&self) -> &[KeyboardKey] {
        &self.keys
    }

    pub fn white_keys(&self) -> impl Iterator<Item = &KeyboardKey> {
        self.keys.iter().filter(|k| !k.is_black)
    }

    pub fn find(&self, name: &str) -> Option<&KeyboardKey> {
        self.keys.iter().find(|k| k.name == name)
    }

    pub fn contains(&self, midi: u8) -> bool {
        self.keys
            .first()
            .zip(self.keys.last())
            .is_some_and(|(lo, hi)| (lo.midi..=hi.midi).contains(&midi))
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::new(DEFAULT_START_OCTAVE)
    }
}
