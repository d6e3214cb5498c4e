//! koma - terminal microtonal instrument
//!
//! Run with: cargo run [-- rast|hicaz|ussak]

mod app;
mod layout;
mod ui;

use app::Koma;
use koma::dsp::Waveform;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let fragment = match std::env::args().nth(1).as_deref() {
        Some("hicaz") => layout::hicaz(),
        Some("ussak") => layout::ussak(),
        _ => layout::rast(),
    };

    Koma::new()
        .scale(fragment)
        .waveform(Waveform::Triangle)
        .gain(0.35)
        .run()
}
