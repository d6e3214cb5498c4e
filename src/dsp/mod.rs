//! Low-level DSP primitives used by the bundled generator bank.
//!
//! These components are allocation-free and realtime-safe, so they can run
//! directly inside the audio callback. They stay focused on the
//! signal-processing math; voice orchestration lives in [`crate::synth`].

/// Release decay curve builder.
pub mod curve;
/// Oscillator waveforms.
pub mod oscillator;

pub use curve::{decay_curve, default_decay_curve};
pub use oscillator::Waveform;
