//! The input-state collaborator.
//!
//! The driving loop polls an [`InputSource`] once per frame and hands the resulting
//! [`InputState`] to the simulation by reference. The snapshot is frozen for the whole tick, there
//! is no global input manager.

use fixedbitset::FixedBitSet;

use crate::math::Vector;

/// Key codes understood by the simulation. These follow the classic virtual key numbering.
pub mod keys {
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const LEFT: u32 = 37;
    pub const UP: u32 = 38;
    pub const RIGHT: u32 = 39;
    pub const DOWN: u32 = 40;
    pub const A: u32 = 65;
    pub const D: u32 = 68;
    pub const S: u32 = 83;
    pub const W: u32 = 87;
}

/// Mouse button indexes.
pub mod buttons {
    pub const LEFT: u32 = 0;
    pub const RIGHT: u32 = 1;
    pub const MIDDLE: u32 = 2;
}

/// Highest key code (exclusive) tracked by an [`InputState`]. Codes outside the range are never
/// reported as pressed.
pub const KEY_CAPACITY: usize = 256;

const BUTTON_CAPACITY: usize = 8;

/// A snapshot of keyboard and mouse state.
#[derive(Debug, Clone)]
pub struct InputState {
    keys: FixedBitSet,
    keys_just_pressed: FixedBitSet,
    buttons: FixedBitSet,
    buttons_just_pressed: FixedBitSet,
    mouse: Vector,
}

impl InputState {
    /// Construct a snapshot with nothing pressed and the mouse at the origin.
    pub fn new() -> Self {
        Self {
            keys: FixedBitSet::with_capacity(KEY_CAPACITY),
            keys_just_pressed: FixedBitSet::with_capacity(KEY_CAPACITY),
            buttons: FixedBitSet::with_capacity(BUTTON_CAPACITY),
            buttons_just_pressed: FixedBitSet::with_capacity(BUTTON_CAPACITY),
            mouse: Vector::ZERO,
        }
    }

    /// Clear the "just pressed" edges. Sources call this before applying a new batch of events.
    pub fn begin_tick(&mut self) {
        self.keys_just_pressed.clear();
        self.buttons_just_pressed.clear();
    }

    /// Record a key press.
    pub fn press(&mut self, code: u32) {
        let Some(index) = key_index(code) else {
            return;
        };
        if !self.keys.contains(index) {
            self.keys_just_pressed.insert(index);
        }
        self.keys.insert(index);
    }

    /// Record a key release.
    pub fn release(&mut self, code: u32) {
        if let Some(index) = key_index(code) {
            self.keys.set(index, false);
        }
    }

    pub fn is_key_pressed(&self, code: u32) -> bool {
        key_index(code).is_some_and(|index| self.keys.contains(index))
    }

    /// Whether the key went down since the last `begin_tick`.
    pub fn is_key_just_pressed(&self, code: u32) -> bool {
        key_index(code).is_some_and(|index| self.keys_just_pressed.contains(index))
    }

    /// Whether any of the given keys is held.
    pub fn any_pressed(&self, codes: &[u32]) -> bool {
        codes.iter().any(|&code| self.is_key_pressed(code))
    }

    pub fn press_button(&mut self, button: u32) {
        let Some(index) = button_index(button) else {
            return;
        };
        if !self.buttons.contains(index) {
            self.buttons_just_pressed.insert(index);
        }
        self.buttons.insert(index);
    }

    pub fn release_button(&mut self, button: u32) {
        if let Some(index) = button_index(button) {
            self.buttons.set(index, false);
        }
    }

    pub fn is_mouse_button_pressed(&self, button: u32) -> bool {
        button_index(button).is_some_and(|index| self.buttons.contains(index))
    }

    pub fn is_mouse_button_just_pressed(&self, button: u32) -> bool {
        button_index(button).is_some_and(|index| self.buttons_just_pressed.contains(index))
    }

    pub fn set_mouse_position(&mut self, position: Vector) {
        self.mouse = position;
    }

    pub fn mouse_position(&self) -> Vector {
        self.mouse
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

fn key_index(code: u32) -> Option<usize> {
    let index = code as usize;
    (index < KEY_CAPACITY).then_some(index)
}

fn button_index(button: u32) -> Option<usize> {
    let index = button as usize;
    (index < BUTTON_CAPACITY).then_some(index)
}

/// Something that can produce an input snapshot once per frame.
pub trait InputSource {
    /// Apply whatever happened since the last poll and return the frozen snapshot for this frame.
    fn poll(&mut self) -> InputState;
}

/// An input source that never changes. Useful for tests and unattended runs.
#[derive(Debug, Clone, Default)]
pub struct Fixed(pub InputState);

impl InputSource for Fixed {
    fn poll(&mut self) -> InputState {
        self.0.clone()
    }
}
