//! A single sounding unit: one generator plus its amplitude bookkeeping.

use crate::backend::{BackendError, GeneratorBackend, GeneratorId};
use crate::dsp::curve::default_decay_curve;
use crate::dsp::oscillator::Waveform;
use crate::synth::params::SynthParams;
use crate::tuning;
use crate::{MIN_ATTACK_SECS, MIN_RELEASE_SECS};

/// Re-ramp time used when the gain of a sounding voice changes.
const GAIN_SMOOTHING_SECS: f32 = 0.03;

/// Margin after the decay curve completes before the generator is
/// reclaimed, so the tail is never cut off mid-curve.
const SETTLE_MARGIN_SECS: f32 = 0.05;

/// One voice. Owns exactly one generator for its whole life.
///
/// The decay curve a `stop` will play is cached here and re-anchored on
/// every gain change: a release must fall from whatever the voice's
/// current amplitude is, not from the original attack target.
pub struct Voice {
    generator: GeneratorId,
    step: i32,
    target_gain: f32,
    release_curve: Vec<f32>,
    stopping: bool,
}

impl Voice {
    /// Bring up a generator for `step` and ramp it in.
    ///
    /// Backend failure propagates; no generator is left behind.
    pub fn spawn<B: GeneratorBackend>(
        backend: &mut B,
        params: &SynthParams,
        step: i32,
    ) -> Result<Self, BackendError> {
        let hz = tuning::step_frequency(step, params.base_frequency) as f32;
        let generator = backend.create(params.waveform, hz)?;
        backend.ramp_amplitude(generator, params.gain, params.attack_secs.max(MIN_ATTACK_SECS));

        Ok(Self {
            generator,
            step,
            target_gain: params.gain,
            release_curve: default_decay_curve(params.gain),
            stopping: false,
        })
    }

    pub fn generator(&self) -> GeneratorId {
        self.generator
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Pitch-slide to a new step. Frequency only; the attack envelope
    /// keeps running wherever it is.
    pub fn retune<B: GeneratorBackend>(&mut self, backend: &mut B, step: i32, base: f64) {
        self.step = step;
        let hz = tuning::step_frequency(step, base) as f32;
        backend.set_frequency(self.generator, hz);
    }

    /// Recompute frequency after a base change, from the current step.
    pub fn rebase<B: GeneratorBackend>(&mut self, backend: &mut B, base: f64) {
        let hz = tuning::step_frequency(self.step, base) as f32;
        backend.set_frequency(self.generator, hz);
    }

    /// Re-ramp to a new gain and re-anchor the cached decay curve at it.
    pub fn set_gain<B: GeneratorBackend>(&mut self, backend: &mut B, gain: f32) {
        self.target_gain = gain;
        backend.ramp_amplitude(self.generator, gain, GAIN_SMOOTHING_SECS);
        self.release_curve = default_decay_curve(gain);
    }

    pub fn set_waveform<B: GeneratorBackend>(&mut self, backend: &mut B, waveform: Waveform) {
        backend.set_waveform(self.generator, waveform);
    }

    /// Begin the release: play the cached decay curve over the release
    /// time, then let the backend reclaim the generator.
    ///
    /// Idempotent: a second `stop` on a stopping voice does nothing, so
    /// duplicate up-events can never double-schedule the teardown.
    pub fn stop<B: GeneratorBackend>(&mut self, backend: &mut B, release_secs: f32) {
        if self.stopping {
            return;
        }
        self.stopping = true;

        let secs = release_secs.max(MIN_RELEASE_SECS);
        backend.apply_amplitude_curve(self.generator, &self.release_curve, secs);
        backend.stop_and_release(self.generator, secs + SETTLE_MARGIN_SECS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::test_backend::StubBackend;

    fn params() -> SynthParams {
        SynthParams::default()
    }

    #[test]
    fn spawn_ramps_to_target_gain() {
        let mut backend = StubBackend::default();
        let voice = Voice::spawn(&mut backend, &params(), 0).unwrap();

        assert_eq!(backend.created, 1);
        let (id, target, secs) = backend.ramps[0];
        assert_eq!(id, voice.generator());
        assert_eq!(target, params().gain);
        assert!(secs >= MIN_ATTACK_SECS);
    }

    #[test]
    fn attack_never_shorter_than_floor() {
        let mut backend = StubBackend::default();
        let p = SynthParams {
            attack_secs: 0.0,
            ..params()
        };
        Voice::spawn(&mut backend, &p, 0).unwrap();
        assert_eq!(backend.ramps[0].2, MIN_ATTACK_SECS);
    }

    #[test]
    fn retune_touches_only_frequency() {
        let mut backend = StubBackend::default();
        let mut voice = Voice::spawn(&mut backend, &params(), 10).unwrap();
        let ramps_before = backend.ramps.len();

        voice.retune(&mut backend, 15, params().base_frequency);

        assert_eq!(voice.step(), 15);
        assert_eq!(backend.created, 1, "retune must not build a new generator");
        assert_eq!(backend.ramps.len(), ramps_before, "retune must not re-run the attack");
        let expected = crate::tuning::step_frequency(15, params().base_frequency) as f32;
        assert_eq!(backend.frequency_of(voice.generator()), Some(expected));
    }

    #[test]
    fn gain_change_reanchors_the_decay_curve() {
        let mut backend = StubBackend::default();
        let mut voice = Voice::spawn(&mut backend, &params(), 0).unwrap();

        voice.set_gain(&mut backend, 0.9);
        voice.stop(&mut backend, 0.2);

        let (_, first_point, _) = backend.curves[0];
        assert_eq!(first_point, 0.9, "release must decay from the current gain");
    }

    #[test]
    fn stop_is_idempotent() {
        let mut backend = StubBackend::default();
        let mut voice = Voice::spawn(&mut backend, &params(), 0).unwrap();

        voice.stop(&mut backend, 0.2);
        voice.stop(&mut backend, 0.2);

        assert_eq!(backend.curves.len(), 1);
        assert_eq!(backend.stops.len(), 1, "terminal stop must fire exactly once");
    }

    #[test]
    fn stop_clamps_very_short_releases() {
        let mut backend = StubBackend::default();
        let mut voice = Voice::spawn(&mut backend, &params(), 0).unwrap();

        voice.stop(&mut backend, 0.0);

        let (_, _, secs) = backend.curves[0];
        assert_eq!(secs, MIN_RELEASE_SECS);
        assert!(backend.stops[0].1 > MIN_RELEASE_SECS, "reclaim happens after the curve");
    }
}
