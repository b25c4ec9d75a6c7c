//! Distortion / Waveshaping
//!
//! A waveshaper maps every input sample through a fixed transfer curve. The
//! curve here is the classic soft-clip used by browser synths:
//!
//!   f(x) = (3 + k) · x · 20° / (π + k · |x|)
//!
//! where 20° is expressed in radians (20 · π / 180) and `k` is the drive.
//!
//! # Shape
//!
//! Small inputs get a steep linear gain of roughly (3 + k) · 0.349 / π, so even
//! quiet signals are pushed hard. Large inputs flatten towards
//! ±(3 + k) · 0.349 / k, which is about ±0.35 for k = 400. The result is
//! a dense, fuzzy saturation whose level barely depends on input level.
//!
//! # Lookup
//!
//! The curve is sampled once into a table spanning x ∈ [-1, 1]. Inputs
//! outside that range clamp to the end points; inputs in between are
//! linearly interpolated. Only the dry/wet balance changes at runtime, never
//! the curve.

use std::f32::consts::PI;

/// Drive used for the master distortion stage.
pub const DEFAULT_DRIVE: f32 = 400.0;

/// Points in the lookup table.
pub const CURVE_SIZE: usize = 44_100;

/// The soft-clip transfer function evaluated directly.
#[inline]
pub fn soft_clip(x: f32, drive: f32) -> f32 {
    let deg = PI / 180.0;
    (3.0 + drive) * x * 20.0 * deg / (PI + drive * x.abs())
}

/// Sample the soft-clip curve into a table of `points` entries over [-1, 1].
pub fn soft_clip_curve(drive: f32, points: usize) -> Vec<f32> {
    let points = points.max(2);
    (0..points)
        .map(|i| {
            let x = (i as f32 * 2.0) / (points - 1) as f32 - 1.0;
            soft_clip(x, drive)
        })
        .collect()
}

/// Look `sample` up in `curve`, interpolating between neighbouring points.
#[inline]
pub fn shape(curve: &[f32], sample: f32) -> f32 {
    let last = curve.len() - 1;
    let position = (sample.clamp(-1.0, 1.0) + 1.0) * 0.5 * last as f32;
    let index = position.floor() as usize;
    if index >= last {
        return curve[last];
    }
    let frac = position - index as f32;
    curve[index] + (curve[index + 1] - curve[index]) * frac
}

/// Apply `curve` to an entire buffer in place.
pub fn shape_buffer(curve: &[f32], buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = shape(curve, *sample);
    }
}
