use std::fmt;
use std::str::FromStr;

use crate::patch::{Adsr, Patch, PatchUpdate};

/*
Controller Map
==============

A fixed table from CC number to patch field. Values 0..127 are normalized to
0..1 first (n = value / 127), then scaled:

  CC 91       reverb send                n
  CC 43       filter cutoff              lo + n · (hi - lo), range per mode
  CC 44       resonance                  0-42 → 1, 43-85 → 6, 86-127 → 15
  CC 28       distortion                 n
  CC 24       LFO rate                   0.01 + n · 19.99 Hz
  CC 26       LFO depth                  n
  CC 16..19   amp attack/decay/sus/rel   A, D: 0.01 + n · 2.0 s
                                         S:    n
                                         R:    0.01 + n · 5.0 s

Cutoff ranges:

  bass   20 .. 800 Hz
  lead   100 .. 4000 Hz
  wide   20 .. 12000 Hz

Envelope CCs change one field; the other three come from the current patch.
*/

pub const CC_ATTACK: u8 = 16;
pub const CC_DECAY: u8 = 17;
pub const CC_SUSTAIN: u8 = 18;
pub const CC_RELEASE: u8 = 19;
pub const CC_LFO_RATE: u8 = 24;
pub const CC_LFO_DEPTH: u8 = 26;
pub const CC_DISTORTION: u8 = 28;
pub const CC_CUTOFF: u8 = 43;
pub const CC_RESONANCE: u8 = 44;
pub const CC_REVERB_SEND: u8 = 91;

/// The three resonance levels CC 44 snaps to.
pub const RESONANCE_LEVELS: [f32; 3] = [1.0, 6.0, 15.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoffRange {
    Bass,
    Lead,
    #[default]
    Wide,
}

impl CutoffRange {
    pub const ALL: [CutoffRange; 3] = [CutoffRange::Bass, CutoffRange::Lead, CutoffRange::Wide];

    pub fn bounds(self) -> (f32, f32) {
        match self {
            CutoffRange::Bass => (20.0, 800.0),
            CutoffRange::Lead => (100.0, 4000.0),
            CutoffRange::Wide => (20.0, 12_000.0),
        }
    }

    pub fn scale(self, normalized: f32) -> f32 {
        let (lo, hi) = self.bounds();
        lo + normalized.clamp(0.0, 1.0) * (hi - lo)
    }

    pub fn next(self) -> Self {
        match self {
            CutoffRange::Bass => CutoffRange::Lead,
            CutoffRange::Lead => CutoffRange::Wide,
            CutoffRange::Wide => CutoffRange::Bass,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CutoffRange::Bass => "bass",
            CutoffRange::Lead => "lead",
            CutoffRange::Wide => "wide",
        }
    }
}

impl fmt::Display for CutoffRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CutoffRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bass" => Ok(CutoffRange::Bass),
            "lead" => Ok(CutoffRange::Lead),
            "wide" => Ok(CutoffRange::Wide),
            other => Err(format!("unknown cutoff range '{other}' (bass, lead, wide)")),
        }
    }
}

/// What a control change asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    Patch(PatchUpdate),
    /// Reverb send level; there is no reverb stage, so callers just report it.
    ReverbSend(f32),
}

#[inline]
pub fn normalize(value: u8) -> f32 {
    value.min(127) as f32 / 127.0
}

/// Snap a raw CC value to a resonance level by thirds of the range.
pub fn quantize_resonance(value: u8) -> f32 {
    match value {
        0..=42 => RESONANCE_LEVELS[0],
        43..=85 => RESONANCE_LEVELS[1],
        _ => RESONANCE_LEVELS[2],
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ControlMapper {
    cutoff_range: CutoffRange,
}

impl ControlMapper {
    pub fn new(cutoff_range: CutoffRange) -> Self {
        Self { cutoff_range }
    }

    pub fn cutoff_range(&self) -> CutoffRange {
        self.cutoff_range
    }

    pub fn set_cutoff_range(&mut self, range: CutoffRange) {
        self.cutoff_range = range;
    }

    /// Map one control change. Unknown controllers give `None`.
    pub fn map_cc(&self, controller: u8, value: u8, current: &Patch) -> Option<ControlAction> {
        let n = normalize(value);
        let update = match controller {
            CC_REVERB_SEND => return Some(ControlAction::ReverbSend(n)),
            CC_CUTOFF => PatchUpdate {
                filter_cutoff: Some(self.cutoff_range.scale(n)),
                ..Default::default()
            },
            CC_RESONANCE => PatchUpdate {
                filter_resonance: Some(quantize_resonance(value)),
                ..Default::default()
            },
            CC_DISTORTION => PatchUpdate {
                distortion: Some(n),
                ..Default::default()
            },
            CC_LFO_RATE => PatchUpdate {
                lfo_rate: Some(0.01 + n * 19.99),
                ..Default::default()
            },
            CC_LFO_DEPTH => PatchUpdate {
                lfo_depth: Some(n),
                ..Default::default()
            },
            CC_ATTACK..=CC_RELEASE => {
                let env = current.amp_adsr;
                let amp_adsr = match controller {
                    CC_ATTACK => Adsr {
                        attack: 0.01 + n * 2.0,
                        ..env
                    },
                    CC_DECAY => Adsr {
                        decay: 0.01 + n * 2.0,
                        ..env
                    },
                    CC_SUSTAIN => Adsr { sustain: n, ..env },
                    _ => Adsr {
                        release: 0.01 + n * 5.0,
                        ..env
                    },
                };
                PatchUpdate {
                    amp_adsr: Some(amp_adsr),
                    ..Default::default()
                }
            }
            _ => return None,
        };
        Some(ControlAction::Patch(update))
    }
}
