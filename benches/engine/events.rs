//! Benchmarks for registry event handling.
//!
//! Uses a do-nothing backend so the numbers isolate the registry's own
//! bookkeeping: map churn, liveness updates, curve rebuilds.

use std::collections::VecDeque;
use std::hint::black_box;
use std::time::Instant;

use criterion::Criterion;
use koma::backend::{BackendError, GeneratorBackend, GeneratorId};
use koma::dsp::Waveform;
use koma::synth::{SourceId, SynthParams, VoiceRegistry};

/// Accepts everything and settles stops instantly.
#[derive(Default)]
struct NullBackend {
    next_id: u64,
    settled: VecDeque<GeneratorId>,
}

impl GeneratorBackend for NullBackend {
    fn create(&mut self, _waveform: Waveform, _frequency: f32) -> Result<GeneratorId, BackendError> {
        let id = GeneratorId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn set_frequency(&mut self, _id: GeneratorId, _hz: f32) {}
    fn set_waveform(&mut self, _id: GeneratorId, _waveform: Waveform) {}
    fn ramp_amplitude(&mut self, _id: GeneratorId, _target: f32, _seconds: f32) {}
    fn apply_amplitude_curve(&mut self, _id: GeneratorId, _curve: &[f32], _seconds: f32) {}

    fn stop_and_release(&mut self, id: GeneratorId, _after_seconds: f32) {
        self.settled.push_back(id);
    }

    fn poll_settled(&mut self) -> Option<GeneratorId> {
        self.settled.pop_front()
    }
}

pub fn bench_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/events");
    let now = Instant::now();

    group.bench_function("start_stop", |b| {
        let mut registry = VoiceRegistry::new(NullBackend::default(), SynthParams::default());
        b.iter(|| {
            registry
                .start(SourceId::Pointer(black_box(1)), black_box(17))
                .unwrap();
            registry.stop(&SourceId::Pointer(1), now);
            registry.drain_settled();
        })
    });

    group.bench_function("glide_across_strip", |b| {
        let mut registry = VoiceRegistry::new(NullBackend::default(), SynthParams::default());
        registry.start(SourceId::Pointer(1), 0).unwrap();
        b.iter(|| {
            for step in [9, 17, 22, 31, 22, 17, 9, 0] {
                registry.retune(&SourceId::Pointer(1), black_box(step), now);
            }
        })
    });

    group.bench_function("broadcast_gain_8_voices", |b| {
        let mut registry = VoiceRegistry::new(NullBackend::default(), SynthParams::default());
        for i in 0..8 {
            registry.start(SourceId::Pointer(i), i as i32 * 5).unwrap();
        }
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            registry.set_gain(if flip { 0.6 } else { 0.3 });
        })
    });

    group.finish();
}
