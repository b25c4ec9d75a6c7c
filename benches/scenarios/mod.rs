//! Real-world scenario benchmarks.
//!
//! A single voice with the full per-note graph, then the whole engine with
//! many voices sounding through the mix bus.

mod voices;

pub use voices::bench_voices;
