pub mod backend; // Generator seam and the bundled ring-buffer bank
pub mod display; // Per-step liveness view for the display layer
pub mod dsp;
pub mod input; // Pointer/key/latch state machines
pub mod synth; // Voice lifecycle and polyphony
pub mod tuning; // 53-EDO step math and note naming

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Shortest attack ramp. A zero-time amplitude step is an audible click.
pub const MIN_ATTACK_SECS: f32 = 0.005;

/// Shortest release. Clamps very short releases so the decay curve still
/// has room to resolve without a click.
pub const MIN_RELEASE_SECS: f32 = 0.02;
