use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequencing::notes::{midi_to_freq, note_name, AS3, C3, C4, DS3, DS4, F3, G3, G4};

/*
Step Pattern
============

Sixteen slots, one per sixteenth note of a 4/4 bar:

   0   1   2   3   4   5   6   7   8   9  10  11  12  13  14  15
  [C3][  ][D#3][ ][G3][  ][ ][A#3][C4][ ][ ][ ][G3][ ][C3][ ]
   ●       ○       ●           ●   ●           ●       ●

  ● active   ○ holds a note but muted   [  ] empty

A step is either empty or a note with an `active` flag. A muted step keeps
its note, so toggling it back brings the same note back. "Active but empty"
cannot be expressed. Every index is taken modulo 16.
*/

pub const STEP_COUNT: usize = 16;

/// Probability that `randomize` leaves a step empty.
pub const RANDOM_REST_PROBABILITY: f64 = 0.4;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StepNote {
    pub name: String,
    pub frequency: f32,
}

impl StepNote {
    pub fn new(name: impl Into<String>, frequency: f32) -> Self {
        Self {
            name: name.into(),
            frequency,
        }
    }

    pub fn from_midi(note: u8) -> Self {
        Self::new(note_name(note), midi_to_freq(note))
    }

    /// What an empty step gets when toggled on: middle C.
    pub fn default_note() -> Self {
        Self::new("C4", 261.63)
    }

    /// Low-register notes `randomize` draws from (C minor pentatonic-ish).
    pub fn palette() -> [StepNote; 8] {
        [C3, DS3, F3, G3, AS3, C4, DS4, G4].map(|note| {
            let freq = midi_to_freq(note);
            // Rounded to cents of a Hz, the way the notes are labelled
            StepNote::new(note_name(note), (freq * 100.0).round() / 100.0)
        })
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Step {
    #[default]
    Empty,
    Note {
        note: StepNote,
        active: bool,
    },
}

impl Step {
    pub fn is_active(&self) -> bool {
        matches!(self, Step::Note { active: true, .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Step::Empty)
    }

    pub fn note(&self) -> Option<&StepNote> {
        match self {
            Step::Empty => None,
            Step::Note { note, .. } => Some(note),
        }
    }

    /// The note to play, if this step is active.
    pub fn playable(&self) -> Option<&StepNote> {
        match self {
            Step::Note { note, active: true } => Some(note),
            _ => None,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepPattern {
    steps: [Step; STEP_COUNT],
}

impl StepPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step; STEP_COUNT] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> &Step {
        &self.steps[index % STEP_COUNT]
    }

    /// Flip a step's active flag; an empty step gets the default note, active.
    pub fn toggle(&mut self, index: usize) {
        let step = &mut self.steps[index % STEP_COUNT];
        match step {
            Step::Note { active, .. } => *active = !*active,
            Step::Empty => {
                *step = Step::Note {
                    note: StepNote::default_note(),
                    active: true,
                }
            }
        }
    }

    /// Write `note` into a step and activate it.
    pub fn set_note(&mut self, index: usize, note: StepNote) {
        self.steps[index % STEP_COUNT] = Step::Note { note, active: true };
    }

    pub fn clear(&mut self) {
        self.steps = Default::default();
    }

    /// Refill every step: empty with probability 0.4, otherwise a random
    /// palette note, active.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let palette = StepNote::palette();
        for step in self.steps.iter_mut() {
            *step = if rng.gen::<f64>() > RANDOM_REST_PROBABILITY {
                let note = palette[rng.gen_range(0..palette.len())].clone();
                Step::Note { note, active: true }
            } else {
                Step::Empty
            };
        }
    }

    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn toggle_inserts_default_then_mutes() {
        let mut pattern = StepPattern::new();

        pattern.toggle(3);
        assert_eq!(
            pattern.get(3),
            &Step::Note {
                note: StepNote::default_note(),
                active: true
            }
        );

        pattern.toggle(3);
        assert!(!pattern.get(3).is_active());
        assert_eq!(pattern.get(3).note(), Some(&StepNote::default_note()));

        pattern.toggle(3);
        assert!(pattern.get(3).is_active());
    }

    #[test]
    fn indices_wrap_modulo_sixteen() {
        let mut pattern = StepPattern::new();
        pattern.set_note(17, StepNote::new("G3", 196.0));
        assert!(pattern.get(1).is_active());
        assert!(pattern.get(33).is_active());
        assert_eq!(pattern.active_count(), 1);
    }

    #[test]
    fn palette_matches_labelled_frequencies() {
        let palette = StepNote::palette();
        let names: Vec<&str> = palette.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["C3", "D#3", "F3", "G3", "A#3", "C4", "D#4", "G4"]);

        let expected = [130.81, 155.56, 174.61, 196.0, 233.08, 261.63, 311.13, 392.0];
        for (note, freq) in palette.iter().zip(expected) {
            assert!((note.frequency - freq).abs() < 1e-3, "{} was {}", note.name, note.frequency);
        }
    }

    #[test]
    fn randomize_fills_from_palette() {
        let mut pattern = StepPattern::new();
        let mut rng = StdRng::seed_from_u64(7);
        pattern.randomize(&mut rng);

        let palette = StepNote::palette();
        assert_eq!(pattern.steps().len(), STEP_COUNT);
        for step in pattern.steps() {
            match step {
                Step::Empty => {}
                Step::Note { note, active } => {
                    assert!(*active);
                    assert!(palette.contains(note));
                }
            }
        }
    }

    #[test]
    fn randomize_density_is_about_sixty_percent() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pattern = StepPattern::new();
        let mut filled = 0;
        for _ in 0..200 {
            pattern.randomize(&mut rng);
            filled += pattern.active_count();
        }

        let density = filled as f64 / (200 * STEP_COUNT) as f64;
        assert!((density - 0.6).abs() < 0.05, "density {density}");
    }

    #[test]
    fn clear_empties_everything() {
        let mut pattern = StepPattern::new();
        pattern.randomize(&mut StdRng::seed_from_u64(1));
        pattern.toggle(0);
        pattern.clear();

        assert!(pattern.steps().iter().all(Step::is_empty));
        assert_eq!(pattern.active_count(), 0);
    }
}
