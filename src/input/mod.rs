// Purpose: turn raw pointer/key/latch events into registry calls.
// Input backends redeliver and reorder events; everything here is built
// to shrug that off.

pub mod router;

pub use router::InputRouter;
