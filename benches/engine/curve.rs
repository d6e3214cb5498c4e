//! Benchmarks for decay curve construction.
//!
//! A curve is rebuilt on every gain change of every live voice, so it
//! sits on the UI-to-audio control path.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use koma::dsp::curve::{decay_curve, CURVE_FLOOR};

pub fn bench_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/curve");

    for &points in &[64usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("build", points), &points, |b, &points| {
            b.iter(|| decay_curve(black_box(0.8), black_box(CURVE_FLOOR), black_box(points)))
        });
    }

    group.finish();
}
