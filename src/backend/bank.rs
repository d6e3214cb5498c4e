//! Bundled realtime generator bank.
//!
//! Two halves connected by lock-free ring buffers:
//!
//! - [`BankHandle`] lives on the control thread and implements
//!   [`GeneratorBackend`] by pushing commands.
//! - [`GeneratorBank`] lives in the audio callback. It drains commands at
//!   the top of every block, renders its generators, and pushes a settle
//!   notification back when a stopped generator is reclaimed.
//!
//! The render path never locks, blocks, or allocates; curve buffers are
//! built on the control side and shipped through the command ring by
//! value.

use rtrb::{Consumer, Producer, RingBuffer};

use super::{BackendError, GeneratorBackend, GeneratorId};
use crate::dsp::oscillator::{Oscillator, Waveform};

/// Generator slots in the bank. Sounding and still-releasing generators
/// both occupy a slot.
pub const MAX_GENERATORS: usize = 32;

const COMMAND_QUEUE_SIZE: usize = 256;
const SETTLE_QUEUE_SIZE: usize = MAX_GENERATORS * 2;

enum BankCommand {
    Create {
        id: GeneratorId,
        waveform: Waveform,
        frequency: f32,
    },
    SetFrequency {
        id: GeneratorId,
        hz: f32,
    },
    SetWaveform {
        id: GeneratorId,
        waveform: Waveform,
    },
    RampAmplitude {
        id: GeneratorId,
        target: f32,
        seconds: f32,
    },
    ApplyCurve {
        id: GeneratorId,
        curve: Vec<f32>,
        seconds: f32,
    },
    StopAndRelease {
        id: GeneratorId,
        after_seconds: f32,
    },
}

/// What the amplitude of one slot is currently doing.
enum AmpLane {
    /// Hold the last level.
    Hold,
    Ramp {
        from: f32,
        to: f32,
        total: u32,
        elapsed: u32,
    },
    Curve {
        points: Vec<f32>,
        total: u32,
        elapsed: u32,
    },
}

struct Slot {
    id: GeneratorId,
    osc: Oscillator,
    level: f32,
    lane: AmpLane,
    /// Samples until forced silence and reclaim; `None` while running.
    stop_in: Option<u32>,
}

impl Slot {
    /// Advance the amplitude lane by one sample and return the level.
    fn tick_level(&mut self) -> f32 {
        let mut finished = false;
        match &mut self.lane {
            AmpLane::Hold => {}
            AmpLane::Ramp {
                from,
                to,
                total,
                elapsed,
            } => {
                *elapsed += 1;
                let t = (*elapsed as f32 / (*total).max(1) as f32).min(1.0);
                self.level = *from + (*to - *from) * t;
                finished = *elapsed >= *total;
            }
            AmpLane::Curve {
                points,
                total,
                elapsed,
            } => {
                *elapsed += 1;
                let t = (*elapsed as f32 / (*total).max(1) as f32).min(1.0);
                let pos = t * (points.len() - 1) as f32;
                let i = pos as usize;
                let a = points[i];
                let b = points[(i + 1).min(points.len() - 1)];
                self.level = a + (b - a) * (pos - i as f32);
                finished = *elapsed >= *total;
            }
        }
        if finished {
            self.lane = AmpLane::Hold;
        }
        self.level
    }
}

/// Audio-side half: owns the generators, runs inside the render callback.
pub struct GeneratorBank {
    slots: Vec<Slot>,
    rx: Consumer<BankCommand>,
    settle_tx: Producer<GeneratorId>,
    sample_rate: f32,
}

impl GeneratorBank {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of live slots (sounding or releasing).
    pub fn active(&self) -> usize {
        self.slots.len()
    }

    /// Render one mono block, mixing every generator additively.
    pub fn render(&mut self, out: &mut [f32]) {
        self.drain_commands();

        out.fill(0.0);
        let sample_rate = self.sample_rate;

        let mut i = 0;
        while i < self.slots.len() {
            let slot = &mut self.slots[i];
            let mut reclaim = false;

            for sample in out.iter_mut() {
                if let Some(remaining) = slot.stop_in.as_mut() {
                    if *remaining == 0 {
                        reclaim = true;
                        break;
                    }
                    *remaining -= 1;
                }
                let level = slot.tick_level();
                *sample += slot.osc.next_sample(sample_rate) * level;
            }

            if reclaim {
                let id = self.slots.swap_remove(i).id;
                let _ = self.settle_tx.push(id);
            } else {
                i += 1;
            }
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.rx.pop() {
            match cmd {
                BankCommand::Create {
                    id,
                    waveform,
                    frequency,
                } => {
                    if self.slots.len() < MAX_GENERATORS {
                        self.slots.push(Slot {
                            id,
                            osc: Oscillator::new(waveform, frequency),
                            level: 0.0,
                            lane: AmpLane::Hold,
                            stop_in: None,
                        });
                    }
                }
                BankCommand::SetFrequency { id, hz } => {
                    if let Some(slot) = self.slot_mut(id) {
                        slot.osc.set_frequency(hz);
                    }
                }
                BankCommand::SetWaveform { id, waveform } => {
                    if let Some(slot) = self.slot_mut(id) {
                        slot.osc.set_waveform(waveform);
                    }
                }
                BankCommand::RampAmplitude {
                    id,
                    target,
                    seconds,
                } => {
                    let sample_rate = self.sample_rate;
                    if let Some(slot) = self.slot_mut(id) {
                        slot.lane = AmpLane::Ramp {
                            from: slot.level,
                            to: target,
                            total: secs_to_samples(seconds, sample_rate),
                            elapsed: 0,
                        };
                    }
                }
                BankCommand::ApplyCurve { id, curve, seconds } => {
                    let sample_rate = self.sample_rate;
                    if let Some(slot) = self.slot_mut(id) {
                        if curve.is_empty() {
                            slot.lane = AmpLane::Hold;
                        } else {
                            slot.lane = AmpLane::Curve {
                                points: curve,
                                total: secs_to_samples(seconds, sample_rate),
                                elapsed: 0,
                            };
                        }
                    }
                }
                BankCommand::StopAndRelease { id, after_seconds } => {
                    let sample_rate = self.sample_rate;
                    if let Some(slot) = self.slot_mut(id) {
                        slot.stop_in = Some(secs_to_samples(after_seconds, sample_rate));
                    }
                }
            }
        }
    }

    fn slot_mut(&mut self, id: GeneratorId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }
}

fn secs_to_samples(seconds: f32, sample_rate: f32) -> u32 {
    (seconds.max(0.0) * sample_rate).round().max(1.0) as u32
}

/// Control-side half: allocates ids, pushes commands, drains settles.
pub struct BankHandle {
    tx: Producer<BankCommand>,
    settle_rx: Consumer<GeneratorId>,
    next_id: u64,
    /// Created minus settled; mirrors how many slots the bank holds.
    outstanding: usize,
}

impl GeneratorBackend for BankHandle {
    fn create(&mut self, waveform: Waveform, frequency: f32) -> Result<GeneratorId, BackendError> {
        if self.outstanding >= MAX_GENERATORS {
            return Err(BackendError::BankFull(self.outstanding));
        }
        let id = GeneratorId(self.next_id);
        self.tx
            .push(BankCommand::Create {
                id,
                waveform,
                frequency,
            })
            .map_err(|_| BackendError::ChannelFull)?;
        self.next_id += 1;
        self.outstanding += 1;
        Ok(id)
    }

    fn set_frequency(&mut self, id: GeneratorId, hz: f32) {
        let _ = self.tx.push(BankCommand::SetFrequency { id, hz });
    }

    fn set_waveform(&mut self, id: GeneratorId, waveform: Waveform) {
        let _ = self.tx.push(BankCommand::SetWaveform { id, waveform });
    }

    fn ramp_amplitude(&mut self, id: GeneratorId, target: f32, seconds: f32) {
        let _ = self.tx.push(BankCommand::RampAmplitude {
            id,
            target,
            seconds,
        });
    }

    fn apply_amplitude_curve(&mut self, id: GeneratorId, curve: &[f32], seconds: f32) {
        let _ = self.tx.push(BankCommand::ApplyCurve {
            id,
            curve: curve.to_vec(),
            seconds,
        });
    }

    fn stop_and_release(&mut self, id: GeneratorId, after_seconds: f32) {
        let _ = self.tx.push(BankCommand::StopAndRelease { id, after_seconds });
    }

    fn poll_settled(&mut self) -> Option<GeneratorId> {
        let id = self.settle_rx.pop().ok()?;
        self.outstanding = self.outstanding.saturating_sub(1);
        Some(id)
    }
}

/// Build a connected bank/handle pair for the given sample rate.
pub fn bank_pair(sample_rate: f32) -> (GeneratorBank, BankHandle) {
    let (tx, rx) = RingBuffer::<BankCommand>::new(COMMAND_QUEUE_SIZE);
    let (settle_tx, settle_rx) = RingBuffer::<GeneratorId>::new(SETTLE_QUEUE_SIZE);

    let bank = GeneratorBank {
        slots: Vec::with_capacity(MAX_GENERATORS),
        rx,
        settle_tx,
        sample_rate,
    };
    let handle = BankHandle {
        tx,
        settle_rx,
        next_id: 0,
        outstanding: 0,
    };

    (bank, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn create_ramp_render_produces_sound() {
        let (mut bank, mut handle) = bank_pair(SAMPLE_RATE);
        let id = handle.create(Waveform::Sine, 100.0).unwrap();
        handle.ramp_amplitude(id, 0.8, 0.01);

        let mut block = vec![0.0f32; 128];
        bank.render(&mut block);

        assert_eq!(bank.active(), 1);
        assert!(peak(&block) > 0.1, "expected audible output");
    }

    #[test]
    fn stop_reclaims_and_settles_once() {
        let (mut bank, mut handle) = bank_pair(SAMPLE_RATE);
        let id = handle.create(Waveform::Square, 50.0).unwrap();
        handle.ramp_amplitude(id, 0.5, 0.005);
        handle.stop_and_release(id, 0.02); // 20 samples

        let mut block = vec![0.0f32; 128];
        bank.render(&mut block);

        assert_eq!(bank.active(), 0);
        assert_eq!(handle.poll_settled(), Some(id));
        assert_eq!(handle.poll_settled(), None);

        // A fresh block after reclaim is silent.
        bank.render(&mut block);
        assert_eq!(peak(&block), 0.0);
    }

    #[test]
    fn bank_full_refuses_creation() {
        let (_bank, mut handle) = bank_pair(SAMPLE_RATE);
        for _ in 0..MAX_GENERATORS {
            handle.create(Waveform::Sine, 100.0).unwrap();
        }
        assert!(matches!(
            handle.create(Waveform::Sine, 100.0),
            Err(BackendError::BankFull(_))
        ));
    }

    #[test]
    fn settling_frees_capacity() {
        let (mut bank, mut handle) = bank_pair(SAMPLE_RATE);
        let mut block = vec![0.0f32; 64];

        for _ in 0..MAX_GENERATORS {
            let id = handle.create(Waveform::Sine, 100.0).unwrap();
            handle.stop_and_release(id, 0.001);
        }
        bank.render(&mut block);
        while handle.poll_settled().is_some() {}

        assert!(handle.create(Waveform::Sine, 100.0).is_ok());
    }

    #[test]
    fn curve_playback_reaches_the_floor() {
        let (mut bank, mut handle) = bank_pair(SAMPLE_RATE);
        let id = handle.create(Waveform::Sine, 100.0).unwrap();
        handle.ramp_amplitude(id, 1.0, 0.001);

        let mut block = vec![0.0f32; 32];
        bank.render(&mut block);

        // Decay over 64 samples, then hold: the tail of the next blocks
        // should shrink towards the curve floor.
        handle.apply_amplitude_curve(id, &[1.0, 0.5, 0.1, 0.001], 0.064);
        let mut first = vec![0.0f32; 64];
        bank.render(&mut first);
        let mut second = vec![0.0f32; 64];
        bank.render(&mut second);

        assert!(peak(&second) < peak(&first) / 10.0);
    }

    #[test]
    fn commands_for_stale_ids_are_ignored() {
        let (mut bank, mut handle) = bank_pair(SAMPLE_RATE);
        let id = handle.create(Waveform::Sine, 100.0).unwrap();
        handle.stop_and_release(id, 0.001);

        let mut block = vec![0.0f32; 32];
        bank.render(&mut block);
        assert_eq!(bank.active(), 0);

        // The generator is gone; late commands must not panic or revive it.
        handle.set_frequency(id, 200.0);
        handle.ramp_amplitude(id, 1.0, 0.01);
        bank.render(&mut block);
        assert_eq!(bank.active(), 0);
    }
}
