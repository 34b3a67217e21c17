//! The renderer collaborator.
//!
//! The core never decides how pixels reach a screen. It emits draw primitives into a [`Renderer`]
//! between `begin_frame` and `end_frame`. [`Recorder`] is an in-memory implementation used by
//! headless runs and tests.

/// An RGBA color with `f32` channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Construct a color from all four channels.
    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Construct an opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A sink for draw primitives.
///
/// Coordinates are world units with the origin at the top left of the arena.
pub trait Renderer {
    /// Start a new frame. Anything drawn before the matching `end_frame` belongs to this frame.
    fn begin_frame(&mut self);

    /// Finish the current frame and present it.
    fn end_frame(&mut self);

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32, segments: u32, color: Color);

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color);

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Color);

    /// Whether the output surface asked to be closed.
    fn should_close(&self) -> bool;
}

/// A recorded draw primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        segments: u32,
        color: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Color,
    },
}

/// A renderer that keeps the draw commands of the last completed frame in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    current: Vec<DrawCommand>,
    last_frame: Vec<DrawCommand>,
    frames: u64,
    in_frame: bool,
    close_requested: bool,
}

impl Recorder {
    /// Construct an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The draw commands of the last completed frame.
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    /// Number of completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether a frame is currently open.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Text lines drawn in the last completed frame.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.last_frame.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Make `should_close` report true from now on.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn record(&mut self, command: DrawCommand) {
        self.current.push(command);
    }
}

impl Renderer for Recorder {
    fn begin_frame(&mut self) {
        self.current.clear();
        self.in_frame = true;
    }

    fn end_frame(&mut self) {
        self.last_frame = std::mem::take(&mut self.current);
        self.in_frame = false;
        self.frames += 1;
    }

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.record(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32, segments: u32, color: Color) {
        self.record(DrawCommand::Circle {
            cx,
            cy,
            radius,
            segments,
            color,
        });
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color) {
        self.record(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }
}
