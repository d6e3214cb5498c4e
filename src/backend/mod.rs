//! Generator backend seam.
//!
//! The voice layer never touches an oscillator directly; it drives sound
//! generators through [`GeneratorBackend`]. The trait is deliberately
//! narrow (create, retune, reshape amplitude, tear down) and all timing
//! is "seconds from now": nothing here assumes sample-accurate scheduling
//! from the backend.
//!
//! Teardown is asynchronous. `stop_and_release` only schedules the
//! generator's reclamation; the backend reports the completed stop later
//! as a settle notification drained through `poll_settled`. Callers must
//! tolerate settles for generators they have already forgotten about.

use thiserror::Error;

use crate::dsp::oscillator::Waveform;

/// Opaque handle to one sound generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratorId(pub u64);

#[derive(Debug, Error)]
pub enum BackendError {
    /// Every generator slot is in use (sounding or still releasing).
    #[error("generator bank is full ({0} generators outstanding)")]
    BankFull(usize),
    /// The command channel to the audio side cannot accept more work.
    #[error("generator command channel is full")]
    ChannelFull,
}

pub trait GeneratorBackend {
    /// Bring up a generator at `frequency`, silent until its first
    /// amplitude ramp.
    fn create(&mut self, waveform: Waveform, frequency: f32) -> Result<GeneratorId, BackendError>;

    /// Retune immediately, with no amplitude side effect.
    fn set_frequency(&mut self, id: GeneratorId, hz: f32);

    /// Change the oscillation shape, with no amplitude side effect.
    fn set_waveform(&mut self, id: GeneratorId, waveform: Waveform);

    /// Ramp amplitude linearly from its current level to `target`
    /// (0..=1) over `seconds`.
    fn ramp_amplitude(&mut self, id: GeneratorId, target: f32, seconds: f32);

    /// Play `curve` back as the amplitude over `seconds`, interpolating
    /// linearly between points.
    fn apply_amplitude_curve(&mut self, id: GeneratorId, curve: &[f32], seconds: f32);

    /// Silence and reclaim the generator `after_seconds` from now. The
    /// reclaim surfaces later through [`Self::poll_settled`].
    fn stop_and_release(&mut self, id: GeneratorId, after_seconds: f32);

    /// Drain one settle notification, if any has arrived. Ids may belong
    /// to generators the caller no longer tracks.
    fn poll_settled(&mut self) -> Option<GeneratorId>;
}

#[cfg(feature = "rtrb")]
pub mod bank;

#[cfg(feature = "rtrb")]
pub use bank::{bank_pair, BankHandle, GeneratorBank, MAX_GENERATORS};
