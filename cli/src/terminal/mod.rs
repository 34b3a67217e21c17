//! Terminal collaborators: a [`Renderer`](volley_engine::render::Renderer) that rasterizes draw
//! calls into a character grid, and an [`InputSource`](volley_engine::input::InputSource) fed by
//! crossterm key and mouse events.

mod grid;
mod input;
mod renderer;

pub use grid::{Cell, Grid};
pub use input::{HOLD_POLLS, TerminalInput, key_code};
pub use renderer::TerminalRenderer;

use volley_engine::{config::ArenaConfig, math::Vector};

/// Maps arena coordinates to grid cells and back. The last terminal row is kept for the status
/// line, so the arena gets `rows - 1` rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub arena: ArenaConfig,
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn new(arena: ArenaConfig, cols: u16, rows: u16) -> Self {
        Self { arena, cols, rows }
    }

    fn cell_width(&self) -> f32 {
        self.arena.width / self.cols.max(1) as f32
    }

    fn cell_height(&self) -> f32 {
        self.arena.height / self.rows.max(1) as f32
    }

    /// The cell containing an arena point. May lie outside the grid.
    pub fn to_cell(&self, point: Vector) -> (i32, i32) {
        (
            (point.x / self.cell_width()).floor() as i32,
            (point.y / self.cell_height()).floor() as i32,
        )
    }

    /// The arena point at the center of a cell.
    pub fn to_world(&self, col: u16, row: u16) -> Vector {
        Vector::new(
            (col as f32 + 0.5) * self.cell_width(),
            (row as f32 + 0.5) * self.cell_height(),
        )
    }

    /// Length of an arena distance along x, in cells.
    pub fn cols_for(&self, length: f32) -> f32 {
        length / self.cell_width()
    }

    /// Length of an arena distance along y, in cells.
    pub fn rows_for(&self, length: f32) -> f32 {
        length / self.cell_height()
    }
}
