//! Shared synthesis parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::tuning;

/// The parameters every voice is built from.
///
/// One value of this lives in the registry; the UI mutates it through the
/// registry's setters, which broadcast the change to live voices. Voices
/// themselves keep only what they need for their own envelopes; there is
/// no ambient global state.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    /// Target amplitude of a held voice, 0..=1.
    pub gain: f32,
    pub waveform: Waveform,
    /// Attack ramp length in seconds (floored at [`crate::MIN_ATTACK_SECS`]).
    pub attack_secs: f32,
    /// Release length in seconds (floored at [`crate::MIN_RELEASE_SECS`]).
    pub release_secs: f32,
    /// Frequency of step 0 in Hz.
    pub base_frequency: f64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            gain: 0.3,
            waveform: Waveform::Triangle,
            attack_secs: 0.02,
            release_secs: 0.3,
            base_frequency: tuning::REFERENCE_FREQ,
        }
    }
}
