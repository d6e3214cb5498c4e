//! Koma - application builder, audio stream, and TUI wiring.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;

use koma::backend::bank_pair;
use koma::dsp::Waveform;
use koma::input::InputRouter;
use koma::synth::{SynthParams, VoiceRegistry};
use koma::MAX_BLOCK_SIZE;

use crate::layout::{Layout, ScaleFragment};
use crate::ui::InstrumentApp;

/// Audio samples buffered for the visualization widgets.
const TAP_SIZE: usize = 8192;

/// Main application builder.
pub struct Koma {
    fragment: ScaleFragment,
    params: SynthParams,
}

impl Koma {
    pub fn new() -> Self {
        Self {
            fragment: crate::layout::rast(),
            params: SynthParams::default(),
        }
    }

    /// Choose the scale fragment laid out across the keyboard.
    pub fn scale(mut self, fragment: ScaleFragment) -> Self {
        self.fragment = fragment;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.params.waveform = waveform;
        self
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.params.gain = gain.clamp(0.0, 1.0);
        self
    }

    /// Run the instrument (takes over the terminal, plays audio).
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        println!("=== koma ===");
        println!("Scale: {}", self.fragment.name);
        println!("Base: {:.2} Hz", self.params.base_frequency);
        println!("Sample rate: {} Hz", sample_rate);
        println!();

        let (mut bank, handle) = bank_pair(sample_rate);
        let (mut tap_tx, tap_rx) = RingBuffer::<f32>::new(TAP_SIZE);

        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    bank.render(block);

                    // Mono to all channels, plus the visualization tap.
                    let out_off = frames_written * channels;
                    for (i, &sample) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = sample;
                        }
                        let _ = tap_tx.push(sample);
                    }

                    frames_written += frames;
                }
            },
            |err| eprintln!("audio error: {err}"),
            None,
        )?;
        stream.play()?;

        let registry = VoiceRegistry::new(handle, self.params);
        let router = InputRouter::new();
        let layout = Layout::build(&self.fragment);

        let mut app = InstrumentApp::new(registry, router, layout, tap_rx, sample_rate);
        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();
        result
    }
}

impl Default for Koma {
    fn default() -> Self {
        Self::new()
    }
}
