/// Input state tracker.
///
/// The game only has one-shot actions (jump, play again, quit), so all
/// that is tracked is what was pressed since the last drain:
///   - key presses, with auto-repeat counted as a fresh press so a held
///     jump key keeps hopping the way a browser keydown does
///   - left mouse button presses anywhere in the terminal (tap to jump)
///   - whether the terminal was resized
///
/// Release events are ignored entirely.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    pub raw_events: Vec<KeyEvent>,

    clicked: bool,
    resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            clicked: false,
            resized: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per loop iteration, before acting on input.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicked = false;
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.record(ev),
                Err(e) => {
                    log::debug!("dropping unreadable terminal event: {e}");
                    break;
                }
            }
        }
    }

    fn record(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    return;
                }
                self.raw_events.push(key);
                self.fresh_presses.push(key.code);
            }
            Event::Mouse(m) => {
                if m.kind == MouseEventKind::Down(MouseButton::Left) {
                    self.clicked = true;
                }
            }
            Event::Resize(..) => self.resized = true,
            _ => {}
        }
    }

    /// Was this key pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Left mouse button went down this frame.
    pub fn clicked(&self) -> bool {
        self.clicked
    }

    pub fn resized(&self) -> bool {
        self.resized
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
