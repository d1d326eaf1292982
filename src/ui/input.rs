/// Input state tracker.
///
/// Turn-based: every Press or Repeat event counts as one press, and
/// Release events are ignored. Mouse motion and left clicks are recorded
/// in terminal coordinates; the renderer maps them onto the grid.
///
/// Drained once per frame, before input handling.

use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind, poll,
};

pub struct InputState {
    /// Key presses collected during the most recent drain, in order.
    pub presses: Vec<KeyEvent>,

    /// Terminal cell under the mouse pointer, if it moved this frame.
    pub mouse_moved: Option<(u16, u16)>,

    /// Left clicks this frame.
    pub clicks: Vec<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            mouse_moved: None,
            clicks: Vec::with_capacity(2),
        }
    }

    /// Drain all pending terminal events without blocking.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.mouse_moved = None;
        self.clicks.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => self.presses.push(key),
                Ok(Event::Mouse(m)) => match m.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        self.mouse_moved = Some((m.column, m.row));
                    }
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.mouse_moved = Some((m.column, m.row));
                        self.clicks.push((m.column, m.row));
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Typed characters this frame, control chords excluded. For the
    /// free-text action prompt.
    pub fn typed(&self) -> impl Iterator<Item = char> + '_ {
        self.presses.iter().filter_map(|k| match k.code {
            KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => Some(c),
            _ => None,
        })
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
