use std::f32::consts::PI;

/*
State-Variable Lowpass
======================

A topology-preserving-transform (TPT) state-variable filter. Two integrators
with trapezoidal memory; the lowpass output is the second integrator.

  g   tan(π · cutoff / sample_rate)   pre-warped integrator gain
  k   1 / Q                           damping; smaller k = sharper peak

Resonance is given in dB, the way host biquads expose it: the peak at the
cutoff rises by roughly that many dB, so

  Q_linear = 10^(Q_dB / 20)

  0 dB  → Q = 1.0   (gentle bump)
  6 dB  → Q ≈ 2.0
  15 dB → Q ≈ 5.6   (squelchy)

The voice changes cutoff every sample (envelope + LFO), so coefficients are
computed per sample. Cutoff is clamped below Nyquist: the tan() pre-warp
blows up as cutoff approaches sample_rate / 2.
*/

pub const MIN_CUTOFF_HZ: f32 = 10.0;
const MAX_CUTOFF_RATIO: f32 = 0.45;

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
}

impl SVFilter {
    pub fn lowpass() -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    /// Integrator gain for `cutoff_hz`, clamped into the stable range.
    #[inline]
    pub fn compute_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, sample_rate * MAX_CUTOFF_RATIO);
        (PI * cutoff / sample_rate).tan()
    }

    /// Damping for a resonance given in dB.
    #[inline]
    pub fn compute_k(resonance_db: f32) -> f32 {
        1.0 / 10.0_f32.powf(resonance_db.max(0.0) / 20.0)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> f32 {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    /// Filter `buffer` in place with fixed cutoff and resonance.
    pub fn render(&mut self, buffer: &mut [f32], cutoff_hz: f32, resonance_db: f32, sample_rate: f32) {
        let g = Self::compute_g(cutoff_hz, sample_rate);
        let k = Self::compute_k(resonance_db);

        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, k, g);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{OscillatorBlock, Waveform};

    const SAMPLE_RATE: f32 = 48_000.0;

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn filtered_sine_peak(freq: f32, cutoff: f32, resonance_db: f32) -> f32 {
        let mut osc = OscillatorBlock::new(Waveform::Sine);
        let mut buffer = vec![0.0f32; 2048];
        osc.render(&mut buffer, freq, SAMPLE_RATE);

        let mut filter = SVFilter::lowpass();
        filter.render(&mut buffer, cutoff, resonance_db, SAMPLE_RATE);
        peak_after_transient(&buffer)
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = SVFilter::lowpass();
        let mut buffer = vec![1.0; 512];

        filter.render(&mut buffer, 500.0, 0.0, SAMPLE_RATE);

        assert!(buffer[511] > 0.99);
    }

    #[test]
    fn test_lowpass_filters_high_freq() {
        // Two octaves above cutoff at 12 dB/octave
        let peak = filtered_sine_peak(4_000.0, 1_000.0, 0.0);
        assert!(peak < 0.1, "Expected high freq attenuation, got peak: {peak}");
    }

    #[test]
    fn test_resonance_boosts_cutoff() {
        let flat = filtered_sine_peak(1_000.0, 1_000.0, 0.0);
        let resonant = filtered_sine_peak(1_000.0, 1_000.0, 15.0);
        assert!(
            resonant > flat * 3.0,
            "15 dB resonance should boost the cutoff: flat={flat}, resonant={resonant}"
        );
    }

    #[test]
    fn test_cutoff_is_clamped_below_nyquist() {
        let g = SVFilter::compute_g(1.0e6, SAMPLE_RATE);
        assert!(g.is_finite());
        let g_low = SVFilter::compute_g(-50.0, SAMPLE_RATE);
        assert!(g_low > 0.0);
    }

    #[test]
    fn test_high_resonance_stays_stable() {
        let mut osc = OscillatorBlock::new(Waveform::Sawtooth);
        let mut buffer = vec![0.0f32; 48_000];
        osc.render(&mut buffer, 110.0, SAMPLE_RATE);

        let mut filter = SVFilter::lowpass();
        filter.render(&mut buffer, 800.0, 30.0, SAMPLE_RATE);

        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() < 100.0));
    }
}
