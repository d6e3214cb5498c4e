// Purpose: what the display layer is allowed to know.
// The tracker deliberately reports a UI-tuned fade, not the literal audio
// envelope tail.

pub mod liveness;

pub use liveness::{Liveness, LivenessTracker};
