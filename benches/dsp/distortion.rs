//! Benchmarks for the waveshaping curve.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use vibesynth::dsp::distortion::{self, CURVE_SIZE, DEFAULT_DRIVE};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");
    let curve = distortion::soft_clip_curve(DEFAULT_DRIVE, CURVE_SIZE);

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Direct evaluation of the transfer function
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("direct", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for s in buffer.iter_mut() {
                    *s = distortion::soft_clip(black_box(*s), DEFAULT_DRIVE);
                }
            })
        });

        // Table lookup with interpolation, as the mix bus does it
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("curve", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                distortion::shape_buffer(black_box(&curve), black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
