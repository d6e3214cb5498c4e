//! Counting/recording generator backend for unit tests.

use std::collections::{HashMap, VecDeque};

use crate::backend::{BackendError, GeneratorBackend, GeneratorId};
use crate::dsp::oscillator::Waveform;

/// Records every backend call so tests can assert on exact traffic.
#[derive(Default)]
pub(crate) struct StubBackend {
    pub created: usize,
    pub fail_create: bool,
    pub frequencies: HashMap<GeneratorId, f32>,
    pub waveforms: HashMap<GeneratorId, Waveform>,
    /// (id, target, seconds) per ramp request.
    pub ramps: Vec<(GeneratorId, f32, f32)>,
    /// (id, first curve point, seconds) per curve request.
    pub curves: Vec<(GeneratorId, f32, f32)>,
    /// (id, after_seconds) per terminal stop.
    pub stops: Vec<(GeneratorId, f32)>,
    pub settle_queue: VecDeque<GeneratorId>,
    next_id: u64,
}

impl StubBackend {
    pub fn frequency_of(&self, id: GeneratorId) -> Option<f32> {
        self.frequencies.get(&id).copied()
    }

    /// Queue a settle notification, as the audio side would after a stop.
    pub fn settle(&mut self, id: GeneratorId) {
        self.settle_queue.push_back(id);
    }
}

impl GeneratorBackend for StubBackend {
    fn create(&mut self, waveform: Waveform, frequency: f32) -> Result<GeneratorId, BackendError> {
        if self.fail_create {
            return Err(BackendError::BankFull(self.created));
        }
        let id = GeneratorId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.frequencies.insert(id, frequency);
        self.waveforms.insert(id, waveform);
        Ok(id)
    }

    fn set_frequency(&mut self, id: GeneratorId, hz: f32) {
        self.frequencies.insert(id, hz);
    }

    fn set_waveform(&mut self, id: GeneratorId, waveform: Waveform) {
        self.waveforms.insert(id, waveform);
    }

    fn ramp_amplitude(&mut self, id: GeneratorId, target: f32, seconds: f32) {
        self.ramps.push((id, target, seconds));
    }

    fn apply_amplitude_curve(&mut self, id: GeneratorId, curve: &[f32], seconds: f32) {
        let first = curve.first().copied().unwrap_or(0.0);
        self.curves.push((id, first, seconds));
    }

    fn stop_and_release(&mut self, id: GeneratorId, after_seconds: f32) {
        self.stops.push((id, after_seconds));
    }

    fn poll_settled(&mut self) -> Option<GeneratorId> {
        self.settle_queue.pop_front()
    }
}
