//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use vibesynth::dsp::oscillator::{OscillatorBlock, Waveform};
use vibesynth::graph::{GraphNode, OscNode, RenderCtx};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Raw oscillator at a fixed frequency, one per waveform
        for waveform in Waveform::ALL {
            let mut osc = OscillatorBlock::new(waveform);
            group.bench_with_input(BenchmarkId::new(waveform.name(), size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
                })
            });
        }

        // Graph node: frequency read from its automation every sample
        let mut node = OscNode::new(Waveform::Sawtooth, 440.0);
        node.start(0.0);
        group.bench_with_input(BenchmarkId::new("node_sawtooth", size), &size, |b, _| {
            b.iter(|| {
                node.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
