//! Spectrum widget.
//!
//! FFT of the audio tap with log-spaced display bins, plus markers at
//! the frequencies of the steps currently sounding, so a played interval
//! can be read straight off its partials.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Display bins across the frequency axis.
const SPECTRUM_BINS: usize = 64;

/// Floor of the magnitude display in dB.
const DB_FLOOR: f64 = -100.0;

pub struct SpectrumView {
    /// Hann window coefficients.
    window: Vec<f32>,
    /// Display frequency per bin (Hz, log-spaced).
    freq_bins: Vec<f64>,
    /// FFT bin index backing each display bin.
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Current spectrum: (frequency_hz, magnitude_db).
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumView {
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer_len);

        // Hann window, to keep tone partials from smearing.
        let window: Vec<f32> = (0..buffer_len)
            .map(|i| {
                if buffer_len > 1 {
                    let denom = (buffer_len - 1) as f32;
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();

        // Log-spaced display bins from 40 Hz to Nyquist. The instrument's
        // two playable octaves sit in the lower half of that range.
        let max_freq = (sample_rate as f64 / 2.0).min(16_000.0).max(1.0);
        let min_freq = 40.0f64.min(max_freq);
        let ratio = max_freq / min_freq;
        let half = (buffer_len / 2).max(1);

        let mut freq_bins = Vec::with_capacity(SPECTRUM_BINS);
        let mut bin_indices = Vec::with_capacity(SPECTRUM_BINS);
        for i in 0..SPECTRUM_BINS {
            let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
            let freq = if ratio > 1.0 {
                min_freq * ratio.powf(t)
            } else {
                min_freq
            };
            let index = (freq * buffer_len as f64 / sample_rate as f64).round() as usize;
            freq_bins.push(freq);
            bin_indices.push(index.min(half - 1));
        }

        let scratch = vec![Complex::new(0.0, 0.0); buffer_len];
        let spectrum = freq_bins.iter().map(|&f| (f, DB_FLOOR)).collect();

        Self {
            window,
            freq_bins,
            bin_indices,
            fft,
            scratch,
            spectrum,
        }
    }

    /// Recompute the spectrum from the latest audio samples. Ignored if
    /// the buffer length does not match the planned FFT size.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for (i, sample) in buffer.iter().enumerate() {
            self.scratch[i].re = *sample * self.window[i];
            self.scratch[i].im = 0.0;
        }

        self.fft.process(&mut self.scratch);

        let half = (self.scratch.len() / 2).max(1);
        for (i, &index) in self.bin_indices.iter().enumerate() {
            let bin = self.scratch[index.min(half - 1)];
            let power = (bin.re * bin.re + bin.im * bin.im).max(1e-12);
            self.spectrum[i] = (self.freq_bins[i], (10.0 * (power as f64).log10()).max(DB_FLOOR));
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum plus fundamental markers for the sounding steps.
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)], markers: &[f64]) {
    let block = Block::default()
        .title(" Spectrum ")
        .borders(Borders::ALL);

    let max_freq = spectrum.iter().map(|(f, _)| *f).fold(0.0, f64::max).max(1.0);
    let max_db = spectrum.iter().map(|(_, db)| *db).fold(DB_FLOOR, f64::max);
    let top_db = max_db.max(0.0) + 10.0;

    // Vertical tick of dots at each sounding fundamental.
    let marker_points: Vec<(f64, f64)> = markers
        .iter()
        .filter(|&&hz| hz <= max_freq)
        .flat_map(|&hz| (0..8).map(move |i| (hz, DB_FLOOR + (top_db - DB_FLOOR) * i as f64 / 7.0)))
        .collect();

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(spectrum),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&marker_points),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, max_freq])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([DB_FLOOR, top_db])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
