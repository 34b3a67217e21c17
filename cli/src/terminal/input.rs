use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use log::error;
use volley_engine::{
    config::ArenaConfig,
    input::{InputSource, InputState, buttons, keys},
};

use super::Viewport;

/// Polls a key press stays held for. Most terminals never report key releases, so a press is
/// treated as held until it stops repeating.
pub const HOLD_POLLS: u8 = 6;

/// Map a terminal key to the simulation's key code.
pub fn key_code(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::Esc => Some(keys::ESCAPE),
        KeyCode::Char(' ') => Some(keys::SPACE),
        KeyCode::Left => Some(keys::LEFT),
        KeyCode::Up => Some(keys::UP),
        KeyCode::Right => Some(keys::RIGHT),
        KeyCode::Down => Some(keys::DOWN),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(keys::W),
            'a' => Some(keys::A),
            's' => Some(keys::S),
            'd' => Some(keys::D),
            _ => None,
        },
        _ => None,
    }
}

fn button_code(button: MouseButton) -> u32 {
    match button {
        MouseButton::Left => buttons::LEFT,
        MouseButton::Right => buttons::RIGHT,
        MouseButton::Middle => buttons::MIDDLE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Key(u32),
    Button(u32),
}

/// An [`InputSource`] fed by crossterm events.
///
/// Each poll drains every pending event without blocking. Presses stay held for [`HOLD_POLLS`]
/// polls unless a release arrives first, and repeats refresh the hold.
#[derive(Debug)]
pub struct TerminalInput {
    state: InputState,
    held: Vec<(Control, u8)>,
    viewport: Viewport,
}

impl TerminalInput {
    pub fn new(arena: ArenaConfig, cols: u16, rows: u16) -> Self {
        Self {
            state: InputState::new(),
            held: Vec::new(),
            viewport: Viewport::new(arena, cols, rows.saturating_sub(1)),
        }
    }

    /// Size the mouse mapping to the current terminal.
    pub fn from_terminal(arena: ArenaConfig) -> std::io::Result<Self> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(Self::new(arena, cols, rows))
    }

    /// The state as it stands, without polling.
    pub fn snapshot(&self) -> InputState {
        self.state.clone()
    }

    /// Start a new poll: clear the edges and let stale holds expire.
    pub fn advance(&mut self) {
        self.state.begin_tick();
        let mut expired = Vec::new();
        self.held.retain_mut(|(control, polls)| {
            *polls = polls.saturating_sub(1);
            if *polls == 0 {
                expired.push(*control);
            }
            *polls > 0
        });
        for control in expired {
            self.release(control);
        }
    }

    /// Apply one terminal event.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::Key(key) => self.apply_key(key),
            Event::Mouse(mouse) => self.apply_mouse(mouse),
            Event::Resize(cols, rows) => {
                self.viewport = Viewport::new(self.viewport.arena, *cols, rows.saturating_sub(1));
            }
            _ => {}
        }
    }

    fn apply_key(&mut self, key: &KeyEvent) {
        let interrupt =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        let code = if interrupt {
            Some(keys::ESCAPE)
        } else {
            key_code(key.code)
        };
        let Some(code) = code else {
            return;
        };
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => self.hold(Control::Key(code)),
            KeyEventKind::Release => self.release(Control::Key(code)),
        }
    }

    fn apply_mouse(&mut self, mouse: &MouseEvent) {
        self.state
            .set_mouse_position(self.viewport.to_world(mouse.column, mouse.row));
        match mouse.kind {
            MouseEventKind::Down(button) => self.hold(Control::Button(button_code(button))),
            MouseEventKind::Drag(button) => self.hold(Control::Button(button_code(button))),
            MouseEventKind::Up(button) => self.release(Control::Button(button_code(button))),
            _ => {}
        }
    }

    fn hold(&mut self, control: Control) {
        match control {
            Control::Key(code) => self.state.press(code),
            Control::Button(button) => self.state.press_button(button),
        }
        match self.held.iter_mut().find(|(held, _)| *held == control) {
            Some((_, polls)) => *polls = HOLD_POLLS,
            None => self.held.push((control, HOLD_POLLS)),
        }
    }

    fn release(&mut self, control: Control) {
        match control {
            Control::Key(code) => self.state.release(code),
            Control::Button(button) => self.state.release_button(button),
        }
        self.held.retain(|(held, _)| *held != control);
    }

    fn read_pending(&mut self) {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(event) => self.apply(&event),
                    Err(e) => {
                        error!("Failed to read terminal event: {e}");
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    error!("Failed to poll terminal events: {e}");
                    break;
                }
            }
        }
    }
}

impl InputSource for TerminalInput {
    fn poll(&mut self) -> InputState {
        self.advance();
        self.read_pending();
        self.snapshot()
    }
}
