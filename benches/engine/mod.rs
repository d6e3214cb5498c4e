//! Voice engine benchmarks.

mod curve;
mod events;
mod render;
mod tuning;

pub use curve::bench_curve;
pub use events::bench_events;
pub use render::bench_render;
pub use tuning::bench_tuning;
