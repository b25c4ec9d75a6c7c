use crate::patch::{Adsr, Patch, PatchUpdate};

/*
Front Panel
===========

Single-key patch edits for a terminal with no knobs. Each press steps one
field of the current patch and yields a `PatchUpdate` for just that field.

  1  osc1 shape         2  osc2 shape         3  LFO shape
  4  LFO → filter on/off                      5  LFO → amp on/off
  -  =  osc mix toward osc1 / osc2

  filter envelope   down  up
    attack           z    x
    decay            c    v
    sustain          b    n
    release          m    ,

Shapes cycle sine → triangle → sawtooth → square → sine.
*/

/// Mix and sustain move by this much per press.
pub const LEVEL_STEP: f32 = 0.05;
/// Envelope times move by this many seconds per press.
pub const TIME_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeField {
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEdit {
    CycleOsc1,
    CycleOsc2,
    CycleLfo,
    ToggleLfoFilter,
    ToggleLfoAmp,
    /// Negative moves toward osc1.
    OscMix(f32),
    /// One filter-envelope field, nudged by `direction` steps.
    FilterEnvelope(EnvelopeField, i8),
}

impl PanelEdit {
    pub fn from_key(c: char) -> Option<Self> {
        use EnvelopeField::*;

        let edit = match c {
            '1' => PanelEdit::CycleOsc1,
            '2' => PanelEdit::CycleOsc2,
            '3' => PanelEdit::CycleLfo,
            '4' => PanelEdit::ToggleLfoFilter,
            '5' => PanelEdit::ToggleLfoAmp,
            '-' => PanelEdit::OscMix(-LEVEL_STEP),
            '=' => PanelEdit::OscMix(LEVEL_STEP),
            'z' => PanelEdit::FilterEnvelope(Attack, -1),
            'x' => PanelEdit::FilterEnvelope(Attack, 1),
            'c' => PanelEdit::FilterEnvelope(Decay, -1),
            'v' => PanelEdit::FilterEnvelope(Decay, 1),
            'b' => PanelEdit::FilterEnvelope(Sustain, -1),
            'n' => PanelEdit::FilterEnvelope(Sustain, 1),
            'm' => PanelEdit::FilterEnvelope(Release, -1),
            ',' => PanelEdit::FilterEnvelope(Release, 1),
            _ => return None,
        };
        Some(edit)
    }

    /// The update this edit makes to `current`.
    pub fn update(self, current: &Patch) -> PatchUpdate {
        match self {
            PanelEdit::CycleOsc1 => PatchUpdate {
                osc1_waveform: Some(current.osc1_waveform.next()),
                ..Default::default()
            },
            PanelEdit::CycleOsc2 => PatchUpdate {
                osc2_waveform: Some(current.osc2_waveform.next()),
                ..Default::default()
            },
            PanelEdit::CycleLfo => PatchUpdate {
                lfo_waveform: Some(current.lfo_waveform.next()),
                ..Default::default()
            },
            PanelEdit::ToggleLfoFilter => PatchUpdate {
                lfo_filter_mod: Some(!current.lfo_filter_mod),
                ..Default::default()
            },
            PanelEdit::ToggleLfoAmp => PatchUpdate {
                lfo_amp_mod: Some(!current.lfo_amp_mod),
                ..Default::default()
            },
            PanelEdit::OscMix(delta) => PatchUpdate {
                osc_mix: Some((current.osc_mix + delta).clamp(0.0, 1.0)),
                ..Default::default()
            },
            PanelEdit::FilterEnvelope(field, direction) => PatchUpdate {
                filter_adsr: Some(nudge(current.filter_adsr, field, direction as f32)),
                ..Default::default()
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelEdit::CycleOsc1 => "osc1 shape",
            PanelEdit::CycleOsc2 => "osc2 shape",
            PanelEdit::CycleLfo => "lfo shape",
            PanelEdit::ToggleLfoFilter => "lfo → filter",
            PanelEdit::ToggleLfoAmp => "lfo → amp",
            PanelEdit::OscMix(_) => "osc mix",
            PanelEdit::FilterEnvelope(EnvelopeField::Attack, _) => "filter attack",
            PanelEdit::FilterEnvelope(EnvelopeField::Decay, _) => "filter decay",
            PanelEdit::FilterEnvelope(EnvelopeField::Sustain, _) => "filter sustain",
            PanelEdit::FilterEnvelope(EnvelopeField::Release, _) => "filter release",
        }
    }
}

fn nudge(env: Adsr, field: EnvelopeField, direction: f32) -> Adsr {
    let time = |t: f32| (t + direction * TIME_STEP).max(0.0);
    match field {
        EnvelopeField::Attack => Adsr {
            attack: time(env.attack),
            ..env
        },
        EnvelopeField::Decay => Adsr {
            decay: time(env.decay),
            ..env
        },
        EnvelopeField::Sustain => Adsr {
            sustain: (env.sustain + direction * LEVEL_STEP).clamp(0.0, 1.0),
            ..env
        },
        EnvelopeField::Release => Adsr {
            release: time(env.release),
            ..env
        },
    }
}
