use std::io::{self, Stdout, Write};

use crossbeam::channel::Receiver;
use crossterm::{
    QueueableCommand, cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, style, terminal,
};
use log::error;
use volley_engine::{
    config::ArenaConfig,
    core::log::LogMessage,
    math::Vector,
    render::{Color, Renderer},
};

use super::{Grid, Viewport};

const STATUS_COLOR: Color = Color::rgb(0.6, 0.6, 0.6);

/// A renderer that rasterizes draw calls into a [`Grid`] and writes it to a terminal.
///
/// The bottom row is a status line showing the latest log message. Write failures are logged and
/// make [`should_close`](Renderer::should_close) report true.
pub struct TerminalRenderer<W: Write = Stdout> {
    out: W,
    grid: Grid,
    viewport: Viewport,
    status: String,
    logs: Option<Receiver<LogMessage>>,
    owns_terminal: bool,
    close_requested: bool,
}

impl TerminalRenderer<Stdout> {
    /// Take over the current terminal: raw mode, alternate screen, hidden cursor and mouse
    /// capture. Everything is restored on drop.
    pub fn new(arena: ArenaConfig) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        terminal::enable_raw_mode()?;

        // Owning the terminal from here on restores it on drop if setup fails halfway
        let mut renderer = Self::with_writer(io::stdout(), arena, cols, rows);
        renderer.owns_terminal = true;
        execute!(
            renderer.out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            terminal::Clear(terminal::ClearType::All)
        )?;
        Ok(renderer)
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Render into any writer with a fixed size. The terminal mode is left alone.
    pub fn with_writer(out: W, arena: ArenaConfig, cols: u16, rows: u16) -> Self {
        Self {
            out,
            grid: Grid::new(cols, rows),
            viewport: Viewport::new(arena, cols, rows.saturating_sub(1)),
            status: String::new(),
            logs: None,
            owns_terminal: false,
            close_requested: false,
        }
    }

    /// Show the newest message from `logs` on the status line every frame.
    pub fn with_logs(mut self, logs: Receiver<LogMessage>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.grid.resize(cols, rows);
        self.viewport = Viewport::new(self.viewport.arena, cols, rows.saturating_sub(1));
    }

    fn drain_logs(&mut self) {
        let Some(logs) = &self.logs else {
            return;
        };
        if let Some(message) = logs.try_iter().last() {
            self.status = format!("[{}] {}", message.level, message.message);
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let status_row = self.grid.rows().saturating_sub(1);
        let status = std::mem::take(&mut self.status);
        self.grid.text(0, status_row as i32, &status, STATUS_COLOR);
        self.status = status;

        let mut foreground = None;
        let mut background = None;
        for row in 0..self.grid.rows() {
            self.out.queue(cursor::MoveTo(0, row))?;
            for cell in self.grid.row(row) {
                if foreground != Some(cell.foreground) {
                    self.out
                        .queue(style::SetForegroundColor(term_color(cell.foreground)))?;
                    foreground = Some(cell.foreground);
                }
                if background != Some(cell.background) {
                    let color = cell.background.map_or(style::Color::Reset, term_color);
                    self.out.queue(style::SetBackgroundColor(color))?;
                    background = Some(cell.background);
                }
                self.out.queue(style::Print(cell.ch))?;
            }
        }
        self.out.queue(style::ResetColor)?;
        self.out.flush()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn begin_frame(&mut self) {
        if self.owns_terminal {
            if let Ok((cols, rows)) = terminal::size() {
                if (cols, rows) != (self.grid.cols(), self.grid.rows()) {
                    self.resize(cols, rows);
                }
            }
        }
        self.grid.clear();
    }

    fn end_frame(&mut self) {
        self.drain_logs();
        if let Err(e) = self.present() {
            error!("Terminal write failed: {e}");
            self.close_requested = true;
        }
    }

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let cols = span(self.viewport.cols_for(x), self.viewport.cols_for(x + width));
        let rows = span(self.viewport.rows_for(y), self.viewport.rows_for(y + height));
        let arena_rows = self.viewport.rows as i32;
        for row in rows.filter(|&row| row < arena_rows) {
            for col in cols.clone() {
                self.grid.fill(col, row, color);
            }
        }
    }

    fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32, _segments: u32, color: Color) {
        let (col, row) = self.viewport.to_cell(Vector::new(cx, cy));
        let rx = self.viewport.cols_for(radius);
        let ry = self.viewport.rows_for(radius);
        if rx < 1.0 && ry < 1.0 {
            self.put_arena(col, row, '*', color);
            return;
        }

        let (reach_x, reach_y) = (rx.ceil() as i32, ry.ceil() as i32);
        for dr in -reach_y..=reach_y {
            for dc in -reach_x..=reach_x {
                let nx = dc as f32 / rx.max(1.0);
                let ny = dr as f32 / ry.max(1.0);
                if nx * nx + ny * ny <= 1.0 {
                    self.put_arena(col + dc, row + dr, 'o', color);
                }
            }
        }
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color) {
        let from = self.viewport.to_cell(Vector::new(x1, y1));
        let to = self.viewport.to_cell(Vector::new(x2, y2));
        let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs());
        for step in 0..=steps {
            let t = if steps == 0 {
                0.0
            } else {
                step as f32 / steps as f32
            };
            let col = from.0 as f32 + (to.0 - from.0) as f32 * t;
            let row = from.1 as f32 + (to.1 - from.1) as f32 * t;
            self.put_arena(col.round() as i32, row.round() as i32, '.', color);
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        let (col, row) = self.viewport.to_cell(Vector::new(x, y));
        if (0..self.viewport.rows as i32).contains(&row) {
            self.grid.text(col, row, text, color);
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }
}

impl<W: Write> TerminalRenderer<W> {
    // Keeps arena drawing off the status row
    fn put_arena(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if row < self.viewport.rows as i32 {
            self.grid.put(col, row, ch, color);
        }
    }
}

impl<W: Write> Drop for TerminalRenderer<W> {
    fn drop(&mut self) {
        if !self.owns_terminal {
            return;
        }
        let restored = execute!(
            self.out,
            style::ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )
        .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = restored {
            error!("Failed to restore terminal: {e}");
        }
    }
}

/// Cells covered by `[start, end)` in cell units. Always at least one cell wide.
fn span(start: f32, end: f32) -> std::ops::Range<i32> {
    let first = start.floor() as i32;
    let last = (end.ceil() as i32).max(first + 1);
    first..last
}

fn term_color(color: Color) -> style::Color {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    style::Color::Rgb {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}
