//! Benchmarks for the step → frequency math.

use std::hint::black_box;

use criterion::Criterion;
use koma::tuning::{step_frequency, REFERENCE_FREQ};

pub fn bench_tuning(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/tuning");

    group.bench_function("step_frequency", |b| {
        b.iter(|| step_frequency(black_box(31), black_box(REFERENCE_FREQ)))
    });

    group.bench_function("two_octave_sweep", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for step in -53..=53 {
                acc += step_frequency(black_box(step), REFERENCE_FREQ);
            }
            acc
        })
    });

    group.finish();
}
