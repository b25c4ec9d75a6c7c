//! Benchmarks for parameter automation timelines.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use vibesynth::dsp::automation::AutomationParam;
use vibesynth::graph::RenderCtx;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // No events - a plain fill
        let param = AutomationParam::new(0.5);
        group.bench_with_input(BenchmarkId::new("constant", size), &size, |b, _| {
            b.iter(|| {
                param.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Linear ramp spanning the block
        let mut param = AutomationParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        group.bench_with_input(BenchmarkId::new("linear_ramp", size), &size, |b, _| {
            b.iter(|| {
                param.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // A full envelope: attack, exponential decay, then release after a cancel
        let mut param = AutomationParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 0.002);
        param.exponential_ramp_to_value_at_time(0.5, 0.005);
        param.cancel_and_hold_at_time(0.004);
        param.exponential_ramp_to_value_at_time(1e-4, 0.01);
        group.bench_with_input(BenchmarkId::new("envelope", size), &size, |b, _| {
            b.iter(|| {
                param.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Smoothed patch edit (exp approach, evaluated with exp() per sample)
        let mut param = AutomationParam::new(1000.0);
        param.set_target_at_time(4000.0, 0.0, 0.05);
        group.bench_with_input(BenchmarkId::new("set_target", size), &size, |b, _| {
            b.iter(|| {
                param.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
