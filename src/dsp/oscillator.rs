//! Naive single-cycle oscillator.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Oscillation shapes offered by the bundled generator bank.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// The next shape in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Triangle,
            Waveform::Triangle => Waveform::Square,
            Waveform::Square => Waveform::Sawtooth,
            Waveform::Sawtooth => Waveform::Sine,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

/// Phase-accumulator oscillator.
///
/// Frequency changes keep the phase, so a retune glides without any
/// discontinuity in the output sample stream.
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    /// Phase in cycles, always in [0, 1).
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    /// Retune without resetting phase.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
    }

    /// Swap the shape mid-cycle; amplitude handling is the caller's concern.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let t = self.phase;
        let value = match self.waveform {
            Waveform::Sine => (std::f32::consts::TAU * t).sin(),
            Waveform::Triangle => {
                if t < 0.5 {
                    4.0 * t - 1.0
                } else {
                    3.0 - 4.0 * t
                }
            }
            Waveform::Square => {
                if t < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * t - 1.0,
        };

        self.phase += self.frequency / sample_rate;
        self.phase -= self.phase.floor();
        value
    }

    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let frequency = 440.0;
        let mut osc = Oscillator::new(Waveform::Sine, frequency);

        let mut buffer = vec![0.0f32; 128];
        osc.render(&mut buffer, sample_rate);

        // sample n should be sin(2pi f n / sr)
        let n = 12;
        let expected = (TAU * frequency * n as f32 / sample_rate).sin();
        let actual = buffer[n];
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn retune_keeps_phase() {
        let sample_rate = 1_000.0;
        let mut osc = Oscillator::new(Waveform::Sawtooth, 100.0);
        for _ in 0..3 {
            osc.next_sample(sample_rate);
        }
        // 3 samples at 100 Hz / 1 kHz = 0.3 cycles in.
        osc.set_frequency(200.0);
        let v = osc.next_sample(sample_rate);
        assert!(
            (v - (2.0 * 0.3 - 1.0)).abs() < 1e-6,
            "retune must not reset phase, got {v}"
        );
    }

    #[test]
    fn shapes_stay_in_range() {
        let sample_rate = 8_000.0;
        for wf in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Square,
            Waveform::Sawtooth,
        ] {
            let mut osc = Oscillator::new(wf, 441.3);
            for _ in 0..4_096 {
                let v = osc.next_sample(sample_rate);
                assert!((-1.0..=1.0).contains(&v), "{wf:?} out of range: {v}");
            }
        }
    }
}
