//! Benchmarks for the voice engine's hot paths.
//!
//! Run with: cargo bench
//!
//! The control path (registry events) runs on the UI thread and has no
//! realtime deadline, but the bank render does:
//!
//!   - 64 samples  = 1.33ms deadline at 48kHz
//!   - 256 samples = 5.33ms deadline at 48kHz
//!
//! Benchmark groups:
//!   - engine/curve     decay curve construction (per gain change)
//!   - engine/tuning    step → frequency math (per retune)
//!   - engine/events    registry start/retune/stop churn
//!   - engine/render    generator bank block rendering

use criterion::{criterion_group, criterion_main};

mod engine;

/// Common audio block sizes.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    engine::bench_curve,
    engine::bench_tuning,
    engine::bench_events,
    engine::bench_render,
);
criterion_main!(benches);
