use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Phase-accumulator oscillator.

  phase      position within one cycle, 0.0 .. 1.0
  increment  frequency / sample_rate, added every sample

  sine       sin(2π·phase)
  triangle   rises -1 → 1 over the first half, falls back over the second
  sawtooth   2·phase - 1 (rising ramp, snaps down)
  square     +1 for the first half, -1 for the second

Shapes are naive (not band-limited). At the pitches a keyboard reaches the
aliasing stays well under the filter, which removes most of it anyway.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Sawtooth,
        Waveform::Square,
    ];

    /// Sample the waveform at `phase` in 0.0 .. 1.0, output in -1.0 ..= 1.0.
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// The next shape in `ALL`, wrapping round.
    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Triangle,
            Waveform::Triangle => Waveform::Sawtooth,
            Waveform::Sawtooth => Waveform::Square,
            Waveform::Square => Waveform::Sine,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Square => "square",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "square" | "sqr" => Ok(Waveform::Square),
            other => Err(format!("unknown waveform '{other}'")),
        }
    }
}

pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Switch shape without resetting phase.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = self.waveform.sample(self.phase);
        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        out
    }

    /// Fill `out` at a fixed frequency.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }
}
