//! Benchmarks for the state-variable lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use vibesynth::dsp::filter::SVFilter;
use vibesynth::graph::{FilterNode, RenderCtx};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Fixed coefficients for the whole block
        let mut filter = SVFilter::lowpass();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("fixed", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), 1000.0, 6.0, SAMPLE_RATE);
            })
        });

        // Per-sample cutoff modulation (coefficients recomputed every sample)
        let mut node = FilterNode::lowpass(1000.0, 6.0);
        let cutoff_mod: Vec<f32> = (0..size)
            .map(|i| 1500.0 * (i as f32 / size as f32))
            .collect();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                node.render_modulated(black_box(&mut buffer), black_box(&cutoff_mod), &ctx);
            })
        });
    }

    group.finish();
}
