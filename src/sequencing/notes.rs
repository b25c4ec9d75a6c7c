use crate::error::{Result, SynthError};

/*
MIDI Notes
==========

Middle C (C4) = MIDI note 60, the standard reference point; A4 = 69 = 440 Hz.

  note_number = 12 * (octave + 1) + semitone
  frequency   = 440 * 2^((note_number - 69) / 12)

Where semitone: C=0, C#=1, D=2, D#=3, E=4, F=5, F#=6, G=7, G#=8, A=9, A#=10, B=11

Names are written with sharps ("C#4"); flats ("Db4") are accepted when
parsing. Octave -1 (MIDI 0-11) is written as "C-1" and so on.
*/

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// Octave 3
pub const C3: u8 = 48;
pub const DS3: u8 = 51;
pub const F3: u8 = 53;
pub const G3: u8 = 55;
pub const AS3: u8 = 58;

// Octave 4 (Middle C octave)
pub const C4: u8 = 60;
pub const DS4: u8 = 63;
pub const G4: u8 = 67;
pub const A4: u8 = 69; // A440 tuning reference

pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Chromatic name with octave `floor(n / 12) - 1`, e.g. 60 → "C4".
pub fn note_name(note: u8) -> String {
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

/// Parse a name such as "C4", "F#3", "Db5" or "C-1" into a MIDI note.
pub fn parse_note_name(name: &str) -> Result<u8> {
    let invalid = || SynthError::InvalidNoteName(name.to_owned());
    let trimmed = name.trim();
    let mut chars = trimmed.chars();

    let letter = chars.next().ok_or_else(invalid)?;
    let mut semitone: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };

    let rest = chars.as_str();
    let octave_str = if let Some(stripped) = rest.strip_prefix('#') {
        semitone += 1;
        stripped
    } else if let Some(stripped) = rest.strip_prefix('b') {
        semitone -= 1;
        stripped
    } else {
        rest
    };

    let octave: i32 = octave_str.parse().map_err(|_| invalid())?;
    let number = 12 * (octave + 1) + semitone;
    u8::try_from(number)
        .ok()
        .filter(|n| *n <= 127)
        .ok_or_else(invalid)
}

/// Frequency of a named note.
pub fn note_to_freq(name: &str) -> Result<f32> {
    parse_note_name(name).map(midi_to_freq)
}
