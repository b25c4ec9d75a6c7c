//! Benchmarks for complete voices and the engine under polyphony.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use vibesynth::{
    graph::RenderCtx,
    patch::{Patch, PatchUpdate},
    synth::Voice,
    EngineConfig, SynthEngine,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn engine_with_voices(count: usize, update: PatchUpdate) -> SynthEngine {
    let mut engine = SynthEngine::new(
        EngineConfig::default()
            .with_sample_rate(SAMPLE_RATE)
            .with_max_voices(count),
    );
    engine.update_params(update);
    for i in 0..count {
        // Spread over two octaves from A2
        let freq = 110.0 * 2.0f32.powf(i as f32 / 12.0);
        let _ = engine.trigger(freq);
    }
    engine
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE VOICE ===
        // Two oscillators, modulated lowpass, amp envelope, LFO
        let mut voice = Voice::new(110.0, &Patch::default(), 0.0);
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === LFO ON BOTH ROUTES ===
        let patch = Patch {
            lfo_depth: 0.5,
            lfo_amp_mod: true,
            ..Patch::default()
        };
        let mut voice = Voice::new(110.0, &patch, 0.0);
        group.bench_with_input(BenchmarkId::new("single_lfo", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === ENGINE ===
        // Full polyphony through the mix bus, with distortion engaged
        for count in [8, 32] {
            let mut engine = engine_with_voices(
                count,
                PatchUpdate {
                    distortion: Some(0.5),
                    ..Default::default()
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("engine_{count}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        engine.render_block(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
