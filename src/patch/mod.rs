//! The synthesis parameter model.
//!
//! A `Patch` is an immutable snapshot: every field is always populated and
//! clamped to its documented range. Edits arrive as a `PatchUpdate` (any
//! subset of fields) and are merged by field overwrite into a NEW snapshot;
//! nothing mutates a patch that a reader may be holding.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
pub const MAX_RESONANCE: f32 = 30.0;
pub const MIN_LFO_RATE: f32 = 0.01;
pub const MAX_LFO_RATE: f32 = 20.0;
pub const MIN_OCTAVE: i8 = -3;
pub const MAX_OCTAVE: i8 = 3;

/// Attack/decay/release in seconds, sustain as a 0..1 level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            attack: non_negative(self.attack),
            decay: non_negative(self.decay),
            sustain: unit(self.sustain),
            release: non_negative(self.release),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub osc1_waveform: Waveform,
    pub osc2_waveform: Waveform,
    pub amp_adsr: Adsr,
    pub filter_adsr: Adsr,
    /// Base lowpass cutoff in Hz.
    pub filter_cutoff: f32,
    /// Resonance in dB.
    pub filter_resonance: f32,
    /// 0.0 = osc1 only, 1.0 = osc2 only.
    pub osc_mix: f32,
    pub octave: i8,
    /// Dry/wet balance of the distortion stage.
    pub distortion: f32,
    pub lfo_waveform: Waveform,
    pub lfo_rate: f32,
    pub lfo_depth: f32,
    pub lfo_filter_mod: bool,
    pub lfo_amp_mod: bool,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            osc1_waveform: Waveform::Triangle,
            osc2_waveform: Waveform::Sawtooth,
            amp_adsr: Adsr::new(0.01, 0.1, 0.5, 0.5),
            filter_adsr: Adsr::new(0.05, 0.5, 0.2, 0.5),
            filter_cutoff: 1000.0,
            filter_resonance: 6.0,
            osc_mix: 0.5,
            octave: 0,
            distortion: 0.0,
            lfo_waveform: Waveform::Sine,
            lfo_rate: 5.0,
            lfo_depth: 0.0,
            lfo_filter_mod: true,
            lfo_amp_mod: false,
        }
    }
}

impl Patch {
    /// Clamp every field into its documented range.
    pub fn clamped(self) -> Self {
        Self {
            amp_adsr: self.amp_adsr.clamped(),
            filter_adsr: self.filter_adsr.clamped(),
            filter_cutoff: finite_or(self.filter_cutoff, 1000.0).clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ),
            filter_resonance: finite_or(self.filter_resonance, 0.0).clamp(0.0, MAX_RESONANCE),
            osc_mix: unit(self.osc_mix),
            octave: self.octave.clamp(MIN_OCTAVE, MAX_OCTAVE),
            distortion: unit(self.distortion),
            lfo_rate: finite_or(self.lfo_rate, 5.0).clamp(MIN_LFO_RATE, MAX_LFO_RATE),
            lfo_depth: unit(self.lfo_depth),
            ..self
        }
    }

    /// Merge `update` over this snapshot, producing a new clamped snapshot.
    pub fn merged(&self, update: &PatchUpdate) -> Patch {
        Patch {
            osc1_waveform: update.osc1_waveform.unwrap_or(self.osc1_waveform),
            osc2_waveform: update.osc2_waveform.unwrap_or(self.osc2_waveform),
            amp_adsr: update.amp_adsr.unwrap_or(self.amp_adsr),
            filter_adsr: update.filter_adsr.unwrap_or(self.filter_adsr),
            filter_cutoff: update.filter_cutoff.unwrap_or(self.filter_cutoff),
            filter_resonance: update.filter_resonance.unwrap_or(self.filter_resonance),
            osc_mix: update.osc_mix.unwrap_or(self.osc_mix),
            octave: update.octave.unwrap_or(self.octave),
            distortion: update.distortion.unwrap_or(self.distortion),
            lfo_waveform: update.lfo_waveform.unwrap_or(self.lfo_waveform),
            lfo_rate: update.lfo_rate.unwrap_or(self.lfo_rate),
            lfo_depth: update.lfo_depth.unwrap_or(self.lfo_depth),
            lfo_filter_mod: update.lfo_filter_mod.unwrap_or(self.lfo_filter_mod),
            lfo_amp_mod: update.lfo_amp_mod.unwrap_or(self.lfo_amp_mod),
        }
        .clamped()
    }

    /// Frequency after the octave shift.
    pub fn shifted_frequency(&self, frequency: f32) -> f32 {
        frequency * 2.0_f32.powi(self.octave as i32)
    }
}

/// A partial edit: `None` leaves the field as it is.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchUpdate {
    pub osc1_waveform: Option<Waveform>,
    pub osc2_waveform: Option<Waveform>,
    pub amp_adsr: Option<Adsr>,
    pub filter_adsr: Option<Adsr>,
    pub filter_cutoff: Option<f32>,
    pub filter_resonance: Option<f32>,
    pub osc_mix: Option<f32>,
    pub octave: Option<i8>,
    pub distortion: Option<f32>,
    pub lfo_waveform: Option<Waveform>,
    pub lfo_rate: Option<f32>,
    pub lfo_depth: Option<f32>,
    pub lfo_filter_mod: Option<bool>,
    pub lfo_amp_mod: Option<bool>,
}

impl PatchUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PatchUpdate::default()
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn unit(value: f32) -> f32 {
    finite_or(value, 0.0).clamp(0.0, 1.0)
}

fn non_negative(value: f32) -> f32 {
    finite_or(value, 0.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_voice_settings() {
        let patch = Patch::default();
        assert_eq!(patch.osc1_waveform, Waveform::Triangle);
        assert_eq!(patch.osc2_waveform, Waveform::Sawtooth);
        assert_eq!(patch.osc_mix, 0.5);
        assert_eq!(patch.filter_cutoff, 1000.0);
        assert_eq!(patch.filter_resonance, 6.0);
        assert_eq!(patch.octave, 0);
    }

    #[test]
    fn empty_update_is_identity() {
        let patch = Patch::default();
        assert_eq!(patch.merged(&PatchUpdate::default()), patch);
        assert!(PatchUpdate::default().is_empty());
    }

    #[test]
    fn update_overwrites_only_given_fields() {
        let patch = Patch::default();
        let merged = patch.merged(&PatchUpdate {
            filter_cutoff: Some(2500.0),
            osc2_waveform: Some(Waveform::Square),
            ..Default::default()
        });

        assert_eq!(merged.filter_cutoff, 2500.0);
        assert_eq!(merged.osc2_waveform, Waveform::Square);
        assert_eq!(merged.osc1_waveform, patch.osc1_waveform);
        assert_eq!(merged.amp_adsr, patch.amp_adsr);
    }

    #[test]
    fn merge_clamps_ratios_and_ranges() {
        let merged = Patch::default().merged(&PatchUpdate {
            osc_mix: Some(1.7),
            distortion: Some(-0.2),
            lfo_depth: Some(f32::NAN),
            octave: Some(9),
            filter_cutoff: Some(0.0),
            amp_adsr: Some(Adsr {
                attack: -1.0,
                decay: 0.2,
                sustain: 3.0,
                release: 0.4,
            }),
            ..Default::default()
        });

        assert_eq!(merged.osc_mix, 1.0);
        assert_eq!(merged.distortion, 0.0);
        assert_eq!(merged.lfo_depth, 0.0);
        assert_eq!(merged.octave, MAX_OCTAVE);
        assert_eq!(merged.filter_cutoff, MIN_CUTOFF_HZ);
        assert_eq!(merged.amp_adsr.attack, 0.0);
        assert_eq!(merged.amp_adsr.sustain, 1.0);
    }

    #[test]
    fn octave_shift_doubles_per_octave() {
        let mut patch = Patch::default();
        assert_eq!(patch.shifted_frequency(261.63), 261.63);

        patch.octave = 2;
        assert!((patch.shifted_frequency(110.0) - 440.0).abs() < 1e-4);

        patch.octave = -1;
        assert!((patch.shifted_frequency(440.0) - 220.0).abs() < 1e-4);
    }
}
