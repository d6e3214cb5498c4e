//! Status bar widget: tuning, parameters, and audio stats.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use koma::backend::BankHandle;
use koma::input::InputRouter;
use koma::synth::VoiceRegistry;
use koma::tuning;

use crate::layout::Layout;

/// Audio statistics for display.
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    registry: &VoiceRegistry<BankHandle>,
    router: &InputRouter,
    layout: &Layout,
    transpose: i32,
    stats: &AudioStats,
    notice: Option<&str>,
) {
    let block = Block::default().title(" koma ").borders(Borders::ALL);

    let params = registry.params();
    let (base_name, base_octave) = tuning::note_name(transpose);

    let mut spans = vec![
        Span::styled(
            format!(" {} ", layout.scale_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "base {}{} {:.1}Hz  ",
                base_name, base_octave, params.base_frequency
            ),
            Style::default().fg(Color::White),
        ),
    ];

    if let Some((step, hz)) = registry.last_touched() {
        spans.push(Span::styled(
            format!("step {step} = {hz:.1}Hz  "),
            Style::default().fg(Color::Yellow),
        ));
    }

    spans.push(Span::styled(
        format!(
            "{}  gain {:.2}  atk {:.0}ms  rel {:.0}ms  ",
            params.waveform.label(),
            params.gain,
            params.attack_secs * 1000.0,
            params.release_secs * 1000.0,
        ),
        Style::default().fg(Color::White),
    ));

    spans.push(Span::styled(
        if router.sustain() { "SUS  " } else { "     " },
        Style::default().fg(Color::Green),
    ));

    spans.push(Span::styled(
        format!(
            "voices {}+{}  ",
            registry.active_voices(),
            registry.tail_count()
        ),
        Style::default().fg(Color::DarkGray),
    ));

    spans.push(Span::styled(
        format!("peak {:.2} rms {:.2}", stats.peak, stats.rms),
        Style::default().fg(Color::Magenta),
    ));

    if let Some(notice) = notice {
        spans.push(Span::styled(
            format!("  {notice}"),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
