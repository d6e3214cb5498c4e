//! TUI for the koma instrument.
//!
//! The control thread owns the registry and the input router; the audio
//! callback only ever sees the generator bank. The widgets read registry
//! state directly each frame, plus a ring-buffer tap of the rendered
//! audio for the oscilloscope and spectrum views.

mod keys;
mod spectrum;
mod status;
mod waveform;

use std::collections::HashMap;
use std::io::stdout;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use ratatui::{
    layout::{Constraint, Direction, Layout as TuiLayout, Rect},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use koma::backend::{BackendError, BankHandle};
use koma::input::InputRouter;
use koma::synth::VoiceRegistry;
use koma::tuning;

use crate::layout::Layout;
use spectrum::SpectrumView;
use status::AudioStats;

/// Audio visualization buffer size.
const VIS_BUFFER_SIZE: usize = 1024;

/// Terminals without key-release reporting fall back to latch-style
/// toggling; OS key-repeat inside this window is treated as one press.
const FALLBACK_DEBOUNCE: Duration = Duration::from_millis(300);

/// The single mouse pointer's id in the pointer machine.
const MOUSE_POINTER: u32 = 0;

pub struct InstrumentApp {
    registry: VoiceRegistry<BankHandle>,
    router: InputRouter,
    layout: Layout,
    /// Ring buffer receiver for rendered audio samples.
    audio_rx: Consumer<f32>,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumView,
    /// 12-tone transposition of the base, in semitones from D4.
    transpose: i32,
    /// Whether the terminal reports key release events.
    key_release_supported: bool,
    /// Last fallback toggle per key, to debounce OS key-repeat.
    fallback_toggles: HashMap<char, Instant>,
    /// Key strip inner area from the last draw, for mouse hit-testing.
    strip_area: Option<Rect>,
    /// Surfaced backend failure, shown in the status bar.
    notice: Option<String>,
    should_quit: bool,
}

impl InstrumentApp {
    pub fn new(
        registry: VoiceRegistry<BankHandle>,
        router: InputRouter,
        layout: Layout,
        audio_rx: Consumer<f32>,
        sample_rate: f32,
    ) -> Self {
        Self {
            registry,
            router,
            layout,
            audio_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumView::new(VIS_BUFFER_SIZE, sample_rate),
            transpose: 0,
            key_release_supported: false,
            fallback_toggles: HashMap::new(),
            strip_area: None,
            notice: None,
            should_quit: false,
        }
    }

    /// Run the UI event loop.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        execute!(stdout(), EnableMouseCapture)?;
        self.key_release_supported = supports_keyboard_enhancement().unwrap_or(false);
        if self.key_release_supported {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(terminal);

        if self.key_release_supported {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableMouseCapture);
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            let now = Instant::now();

            self.registry.drain_settled();
            self.registry.prune_liveness(now);
            self.poll_audio();

            terminal.draw(|frame| self.render(frame, now))?;

            // Non-blocking input, ~60fps redraw cadence.
            if event::poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key, now),
                    Event::Mouse(mouse) => self.handle_mouse(mouse, now),
                    _ => {}
                }
            }
        }

        // Leave nothing ringing behind the closed terminal.
        self.router.silence_all(&mut self.registry, Instant::now());
        Ok(())
    }

    /// Pull new samples from the audio tap, keeping the last
    /// VIS_BUFFER_SIZE of them.
    fn poll_audio(&mut self) {
        let mut new_samples = Vec::new();
        while let Ok(sample) = self.audio_rx.pop() {
            new_samples.push(sample);
        }

        if !new_samples.is_empty() {
            self.audio_buffer.extend(new_samples);
            if self.audio_buffer.len() > VIS_BUFFER_SIZE {
                let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
                self.audio_buffer.drain(0..excess);
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, now: Instant) {
        let chunks = TuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(8),
                Constraint::Length(10),
            ])
            .split(frame.area());

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        status::render_status(
            frame,
            chunks[0],
            &self.registry,
            &self.router,
            &self.layout,
            self.transpose,
            &stats,
            self.notice.as_deref(),
        );

        self.strip_area = Some(keys::render_keys(
            frame,
            chunks[1],
            &self.layout,
            self.registry.liveness(),
            now,
        ));

        waveform::render_waveform(frame, chunks[2], &self.audio_buffer);

        self.spectrum.update(&self.audio_buffer);
        let base = self.registry.params().base_frequency;
        let markers: Vec<f64> = self
            .registry
            .liveness()
            .alive_steps()
            .map(|step| tuning::step_frequency(step, base))
            .collect();
        spectrum::render_spectrum(frame, chunks[3], self.spectrum.data(), &markers);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match key.kind {
            KeyEventKind::Press => self.handle_key_press(key.code, now),
            // The router's down-set already guards repeats; drop them here
            // so the fallback debounce only sees real presses.
            KeyEventKind::Repeat => {}
            KeyEventKind::Release => self.handle_key_release(key.code, now),
        }
    }

    fn handle_key_press(&mut self, code: KeyCode, now: Instant) {
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.router.silence_all(&mut self.registry, now),
            KeyCode::Tab => {
                let on = !self.router.sustain();
                self.router.set_sustain(on);
            }
            KeyCode::Char('z') => {
                let next = self.registry.params().waveform.next();
                self.registry.set_waveform(next);
            }
            KeyCode::Char('x') => self.transpose_by(-1),
            KeyCode::Char('c') => self.transpose_by(1),
            KeyCode::Up => self.nudge_gain(0.05),
            KeyCode::Down => self.nudge_gain(-0.05),
            KeyCode::Right => self.nudge_release(0.05),
            KeyCode::Left => self.nudge_release(-0.05),
            KeyCode::Char('v') => self.nudge_attack(-0.01),
            KeyCode::Char('b') => self.nudge_attack(0.01),
            KeyCode::Char(c) => {
                if let Some(step) = self.layout.step_for_key(c) {
                    self.play_key(c, step, now);
                }
            }
            _ => {}
        }
    }

    fn handle_key_release(&mut self, code: KeyCode, now: Instant) {
        if let KeyCode::Char(c) = code {
            self.router
                .on_key_up(&mut self.registry, &c.to_string(), now);
        }
    }

    fn play_key(&mut self, c: char, step: i32, now: Instant) {
        let result = if self.key_release_supported || self.router.sustain() {
            self.router
                .on_key_down(&mut self.registry, &c.to_string(), step, now)
        } else {
            // No release events from this terminal: play keys as latch
            // toggles, debouncing the repeats the OS keeps sending.
            let repeat = self
                .fallback_toggles
                .insert(c, now)
                .is_some_and(|last| now.duration_since(last) < FALLBACK_DEBOUNCE);
            if repeat {
                Ok(())
            } else {
                self.router.on_latch_activate(&mut self.registry, step, now)
            }
        };
        self.surface(result);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let hit = self.hit_step(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(step) = hit {
                    let result =
                        self.router
                            .on_pointer_down(&mut self.registry, MOUSE_POINTER, step, now);
                    self.surface(result);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(step) = hit {
                    self.router
                        .on_pointer_move(&mut self.registry, MOUSE_POINTER, step, now);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.router
                    .on_pointer_up(&mut self.registry, MOUSE_POINTER, now);
            }
            _ => {}
        }
    }

    fn hit_step(&self, column: u16, row: u16) -> Option<i32> {
        let area = self.strip_area?;
        let index = keys::hit_test(area, self.layout.len(), column, row)?;
        self.layout.step_at(index)
    }

    fn transpose_by(&mut self, semitones: i32) {
        self.transpose += semitones;
        self.registry
            .set_base_frequency(tuning::transposed_base(self.transpose));
    }

    fn nudge_gain(&mut self, delta: f32) {
        let gain = (self.registry.params().gain + delta).clamp(0.0, 1.0);
        self.registry.set_gain(gain);
    }

    fn nudge_release(&mut self, delta: f32) {
        let secs = (self.registry.params().release_secs + delta).clamp(0.0, 4.0);
        self.registry.set_release(secs);
    }

    fn nudge_attack(&mut self, delta: f32) {
        let secs = (self.registry.params().attack_secs + delta).clamp(0.0, 2.0);
        self.registry.set_attack(secs);
    }

    fn surface(&mut self, result: Result<(), BackendError>) {
        if let Err(err) = result {
            self.notice = Some(format!("audio unavailable: {err}"));
        }
    }
}
