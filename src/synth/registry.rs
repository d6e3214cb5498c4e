//! The single authority for which input sources are making which steps
//! sound.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::backend::{BackendError, GeneratorBackend, GeneratorId};
use crate::display::liveness::LivenessTracker;
use crate::dsp::oscillator::Waveform;
use crate::synth::params::SynthParams;
use crate::synth::voice::Voice;
use crate::tuning;

/// Identity of one input source. A voice is unique per source, never per
/// step. Two sources on the same step are legal unison.
///
/// Latch toggles carry no press identity of their own, so for them the
/// step is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    Pointer(u32),
    Key(String),
    Latch(i32),
}

/// Maps [`SourceId`] to at most one live [`Voice`], notifies the
/// liveness tracker of begin/end, and broadcasts parameter changes to
/// everything currently sounding.
pub struct VoiceRegistry<B: GeneratorBackend> {
    backend: B,
    voices: HashMap<SourceId, Voice>,
    params: SynthParams,
    liveness: LivenessTracker,
    /// Generators released but not yet settled by the backend.
    tails: HashSet<GeneratorId>,
    last_touched: Option<(i32, f64)>,
}

impl<B: GeneratorBackend> VoiceRegistry<B> {
    pub fn new(backend: B, params: SynthParams) -> Self {
        Self {
            backend,
            voices: HashMap::new(),
            params,
            liveness: LivenessTracker::new(),
            tails: HashSet::new(),
            last_touched: None,
        }
    }

    /// Start a voice for `source` at `step`.
    ///
    /// A source that already has a voice is left untouched: input
    /// backends redeliver down-events, and a retrigger would both click
    /// and leak the old generator. Backend failure propagates with no
    /// partial registry state.
    pub fn start(&mut self, source: SourceId, step: i32) -> Result<(), BackendError> {
        if self.voices.contains_key(&source) {
            return Ok(());
        }

        let voice = Voice::spawn(&mut self.backend, &self.params, step)?;
        self.voices.insert(source, voice);
        self.liveness.increment(step);
        self.touch(step);
        Ok(())
    }

    /// Pitch-slide the voice owned by `source` to `step` ("drag across
    /// keys"). No voice, or a move onto the step it already sounds:
    /// nothing happens. The attack envelope is never re-run.
    pub fn retune(&mut self, source: &SourceId, step: i32, now: Instant) {
        let Some(voice) = self.voices.get_mut(source) else {
            return;
        };
        let old_step = voice.step();
        if old_step == step {
            return;
        }

        voice.retune(&mut self.backend, step, self.params.base_frequency);
        self.liveness.decrement(old_step, now, self.params.release_secs);
        self.liveness.increment(step);
        self.touch(step);
    }

    /// Release the voice owned by `source`, if any. Idempotent against
    /// duplicate up-events.
    ///
    /// The registry entry is removed immediately (the same source may
    /// start a new voice while the old tail is still decaying), and the
    /// visual fade starts now, not when the generator settles.
    pub fn stop(&mut self, source: &SourceId, now: Instant) {
        let Some(mut voice) = self.voices.remove(source) else {
            return;
        };

        voice.stop(&mut self.backend, self.params.release_secs);
        self.tails.insert(voice.generator());
        self.liveness.decrement(voice.step(), now, self.params.release_secs);
    }

    /// Release everything. Safe at any instant, including mid-attack or
    /// mid-retune, and idempotent.
    pub fn stop_all(&mut self, now: Instant) {
        let sources: Vec<SourceId> = self.voices.keys().cloned().collect();
        for source in sources {
            self.stop(&source, now);
        }
    }

    /// Consume settle notifications from the backend. Returns how many
    /// arrived. Ids nothing remembers (a `stop_all` already forgot them,
    /// or a duplicate notification) are harmless.
    pub fn drain_settled(&mut self) -> usize {
        let mut drained = 0;
        while let Some(id) = self.backend.poll_settled() {
            self.tails.remove(&id);
            drained += 1;
        }
        drained
    }

    // Broadcast setters: live voices track parameter changes without
    // retriggering.

    pub fn set_gain(&mut self, gain: f32) {
        self.params.gain = gain.clamp(0.0, 1.0);
        for voice in self.voices.values_mut() {
            voice.set_gain(&mut self.backend, self.params.gain);
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params.waveform = waveform;
        for voice in self.voices.values_mut() {
            voice.set_waveform(&mut self.backend, waveform);
        }
    }

    /// Attack applies to future voices; a running attack is left alone.
    pub fn set_attack(&mut self, secs: f32) {
        self.params.attack_secs = secs.max(0.0);
    }

    /// Release applies from the next stop onward.
    pub fn set_release(&mut self, secs: f32) {
        self.params.release_secs = secs.max(0.0);
    }

    /// Move step 0 to a new frequency, retuning every sounding voice in
    /// place from its current step. No retrigger, no envelope reset.
    pub fn set_base_frequency(&mut self, hz: f64) {
        self.params.base_frequency = hz;
        for voice in self.voices.values_mut() {
            voice.rebase(&mut self.backend, hz);
        }
        if let Some((step, _)) = self.last_touched {
            self.touch(step);
        }
    }

    // Read-only views for the display layer.

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn liveness(&self) -> &LivenessTracker {
        &self.liveness
    }

    /// Drop expired fade records; call occasionally from the redraw loop.
    pub fn prune_liveness(&mut self, now: Instant) {
        self.liveness.prune(now);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Released generators whose tails are still decaying.
    pub fn tail_count(&self) -> usize {
        self.tails.len()
    }

    pub fn has_voice(&self, source: &SourceId) -> bool {
        self.voices.contains_key(source)
    }

    /// Last step that was started or slid onto, with its current Hz.
    pub fn last_touched(&self) -> Option<(i32, f64)> {
        self.last_touched
    }

    fn touch(&mut self, step: i32) {
        let hz = tuning::step_frequency(step, self.params.base_frequency);
        self.last_touched = Some((step, hz));
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[cfg(test)]
    pub(crate) fn voice(&self, source: &SourceId) -> Option<&Voice> {
        self.voices.get(source)
    }
}
