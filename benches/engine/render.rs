//! Benchmarks for the generator bank's render path.
//!
//! This is the only code here with a realtime deadline.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use koma::backend::{bank_pair, GeneratorBackend};
use koma::dsp::Waveform;

use crate::BLOCK_SIZES;

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/render");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // A held chord of 8 sine voices, fully ramped in.
        let (mut bank, mut handle) = bank_pair(48_000.0);
        for i in 0..8 {
            let id = handle.create(Waveform::Sine, 220.0 + 30.0 * i as f32).unwrap();
            handle.ramp_amplitude(id, 0.3, 0.005);
        }
        bank.render(&mut buffer);

        group.bench_with_input(BenchmarkId::new("8_voices", size), &size, |b, _| {
            b.iter(|| bank.render(black_box(&mut buffer)))
        });

        // Full bank, sawtooth.
        let (mut bank, mut handle) = bank_pair(48_000.0);
        let mut i = 0;
        while let Ok(id) = handle.create(Waveform::Sawtooth, 110.0 + 10.0 * i as f32) {
            handle.ramp_amplitude(id, 0.1, 0.005);
            i += 1;
        }
        bank.render(&mut buffer);

        group.bench_with_input(BenchmarkId::new("full_bank", size), &size, |b, _| {
            b.iter(|| bank.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
