use crate::{dsp::automation::AutomationParam, patch::Adsr, MIN_TIME};

/*
ADSR Envelopes as Automation
============================

An envelope here is not a per-sample state machine; it is a short list of
automation events written onto a parameter at note-on and note-off.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0). On the amp
              stage it multiplies the signal; on the filter offset it scales
              the cutoff sweep.

  stage       Which phase of the envelope we're in: Attack, Decay, Sustain,
              Release, or Finished. Derived from the clock, never stored.

  gate        The note on/off signal. Gate high schedules attack + decay.
              Gate low cancels whatever is pending and schedules release.


The Shape
---------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
        (lin)  (exp)           (exp)

Attack is a LINEAR ramp 0 → 1. Decay and release are EXPONENTIAL ramps,
which match how acoustic sounds fade. An exponential ramp can't reach zero,
so release aims at a small floor; the amp stage then finishes with a 10 ms
linear ramp to true zero.


Events Written at Gate High (start = t0)
----------------------------------------

    set_value_at_time(0, t0)
    linear_ramp_to_value_at_time(1, t0 + A)
    exponential_ramp_to_value_at_time(S, t0 + A + D)

Events Written at Gate Low (release = t1)
-----------------------------------------

    cancel_and_hold_at_time(t1)        level frozen where it is
    exponential_ramp_to_value_at_time(floor, t1 + R)

Cancelling first is what keeps a late decay ramp from fighting the release.
Release always starts from the CURRENT level, not the sustain level, so
releasing during the attack does not click.
*/

/// Release floor for the amplitude stage (about -80 dB).
pub const AMP_RELEASE_FLOOR: f32 = 1e-4;
/// Release floor for the filter envelope offset.
pub const FILTER_RELEASE_FLOOR: f32 = 1e-3;
/// Linear tail from the amp floor down to silence.
pub const AMP_TAIL: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Finished,
}

/// Write attack and decay onto `param`, starting at `start`.
pub fn schedule_attack_decay(param: &mut AutomationParam, adsr: &Adsr, start: f64) {
    let attack_end = start + adsr.attack.max(MIN_TIME) as f64;
    let decay_end = attack_end + adsr.decay.max(MIN_TIME) as f64;

    param.set_value_at_time(0.0, start);
    param.linear_ramp_to_value_at_time(1.0, attack_end);
    param.exponential_ramp_to_value_at_time(adsr.sustain, decay_end);
}

/// Cancel pending automation at `at` and ramp towards `floor` over `release`.
///
/// Returns the time the ramp reaches the floor.
pub fn schedule_release(param: &mut AutomationParam, release: f32, floor: f32, at: f64) -> f64 {
    let end = at + release.max(MIN_TIME) as f64;
    param.cancel_and_hold_at_time(at);
    param.exponential_ramp_to_value_at_time(floor, end);
    end
}

/// Release for the amplitude stage: ramp to the floor, then to true zero.
///
/// Returns the time the amplitude reaches zero.
pub fn schedule_amp_release(param: &mut AutomationParam, release: f32, at: f64) -> f64 {
    let floor_reached = schedule_release(param, release, AMP_RELEASE_FLOOR, at);
    let silent = floor_reached + AMP_TAIL;
    param.linear_ramp_to_value_at_time(0.0, silent);
    silent
}

/// Stage of an envelope that started at `start` and was released at `released`.
pub fn stage_at(adsr: &Adsr, start: f64, released: Option<f64>, t: f64) -> EnvelopeStage {
    if let Some(release_start) = released {
        if t >= release_start {
            let end = release_start + adsr.release.max(MIN_TIME) as f64;
            return if t < end {
                EnvelopeStage::Release
            } else {
                EnvelopeStage::Finished
            };
        }
    }

    let attack_end = start + adsr.attack.max(MIN_TIME) as f64;
    let decay_end = attack_end + adsr.decay.max(MIN_TIME) as f64;
    if t < attack_end {
        EnvelopeStage::Attack
    } else if t < decay_end {
        EnvelopeStage::Decay
    } else {
        EnvelopeStage::Sustain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adsr() -> Adsr {
        Adsr::new(0.01, 0.1, 0.5, 0.5)
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut param = AutomationParam::new(0.0);
        schedule_attack_decay(&mut param, &adsr(), 1.0);

        assert_eq!(param.value_at(1.0), 0.0);
        assert!((param.value_at(1.005) - 0.5).abs() < 1e-4);
        assert!((param.value_at(1.01) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn sustain_holds_target_level() {
        let mut param = AutomationParam::new(0.0);
        schedule_attack_decay(&mut param, &adsr(), 0.0);

        assert!((param.value_at(0.11) - 0.5).abs() < 1e-4);
        assert!((param.value_at(30.0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn zero_sustain_decays_to_floor() {
        let mut param = AutomationParam::new(0.0);
        schedule_attack_decay(&mut param, &Adsr::new(0.0, 0.05, 0.0, 0.1), 0.0);
        assert!(param.value_at(1.0) <= 1e-3);
    }

    #[test]
    fn release_cancels_pending_decay() {
        let mut param = AutomationParam::new(0.0);
        schedule_attack_decay(&mut param, &adsr(), 0.0);

        // Release mid-attack: level is ~0.5 and must fall from there
        let silent = schedule_amp_release(&mut param, 0.5, 0.005);

        let held = param.value_at(0.005);
        assert!((held - 0.5).abs() < 1e-3);
        assert!(param.value_at(0.1) < held, "decay ramp must not pull the level up");
        assert!((silent - 0.515).abs() < 1e-9);
        assert_eq!(param.value_at(silent), 0.0);
    }

    #[test]
    fn stages_follow_the_clock() {
        let env = adsr();
        assert_eq!(stage_at(&env, 0.0, None, 0.005), EnvelopeStage::Attack);
        assert_eq!(stage_at(&env, 0.0, None, 0.05), EnvelopeStage::Decay);
        assert_eq!(stage_at(&env, 0.0, None, 2.0), EnvelopeStage::Sustain);
        assert_eq!(stage_at(&env, 0.0, Some(2.0), 2.2), EnvelopeStage::Release);
        assert_eq!(stage_at(&env, 0.0, Some(2.0), 2.6), EnvelopeStage::Finished);
    }
}
