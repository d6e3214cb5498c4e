//! Key strip widget: the playable steps and their liveness.
//!
//! Each cell is one step of the laid-out scale. Sounding steps light up;
//! released steps dim over the tracker's visual fade rather than
//! snapping dark.

use std::time::Instant;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use koma::display::{Liveness, LivenessTracker};

use crate::layout::Layout;

const LIT: (f32, f32, f32) = (232.0, 196.0, 80.0);
const IDLE: (f32, f32, f32) = (64.0, 64.0, 64.0);

/// Render the strip; returns the inner area used for mouse hit-testing.
pub fn render_keys(
    frame: &mut Frame,
    area: Rect,
    layout: &Layout,
    liveness: &LivenessTracker,
    now: Instant,
) -> Rect {
    let block = Block::default()
        .title(format!(" Keys ({}) ", layout.scale_name))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 || layout.len() == 0 {
        return inner;
    }

    let cell_w = (inner.width as usize / layout.len()).max(2);

    let mut step_spans = Vec::with_capacity(layout.len());
    let mut bar_spans = Vec::with_capacity(layout.len());
    let mut bind_spans = Vec::with_capacity(layout.len());

    for key in layout.keys() {
        let state = liveness.query(key.step, now);
        let color = cell_color(&state);

        step_spans.push(Span::styled(
            format!("{:^width$}", key.step, width = cell_w),
            Style::default().fg(Color::DarkGray),
        ));

        let mut bar = "▆".repeat(cell_w - 1);
        bar.push(' ');
        bar_spans.push(Span::styled(bar, Style::default().fg(color)));

        bind_spans.push(Span::styled(
            format!("{:^width$}", key.binding, width = cell_w),
            Style::default().fg(if state.lit() {
                Color::White
            } else {
                Color::Gray
            }),
        ));
    }

    let paragraph = Paragraph::new(vec![
        Line::from(step_spans),
        Line::from(bar_spans),
        Line::from(bind_spans),
    ]);
    frame.render_widget(paragraph, inner);

    inner
}

/// Map a strip coordinate back to a key index.
pub fn hit_test(inner: Rect, keys: usize, column: u16, row: u16) -> Option<usize> {
    if keys == 0 {
        return None;
    }
    let in_x = column >= inner.x && column < inner.x + inner.width;
    let in_y = row >= inner.y && row < inner.y + inner.height;
    if !in_x || !in_y {
        return None;
    }

    let cell_w = (inner.width as usize / keys).max(2) as u16;
    let index = ((column - inner.x) / cell_w) as usize;
    (index < keys).then_some(index)
}

fn cell_color(state: &Liveness) -> Color {
    if state.alive {
        return Color::Rgb(LIT.0 as u8, LIT.1 as u8, LIT.2 as u8);
    }
    match state.fade_elapsed {
        Some(elapsed) => {
            let t = elapsed.clamp(0.0, 1.0);
            let mix = |lit: f32, idle: f32| (lit + (idle - lit) * t) as u8;
            Color::Rgb(mix(LIT.0, IDLE.0), mix(LIT.1, IDLE.1), mix(LIT.2, IDLE.2))
        }
        None => Color::Rgb(IDLE.0 as u8, IDLE.1 as u8, IDLE.2 as u8),
    }
}
