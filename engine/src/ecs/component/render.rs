use crate::{
    ecs::component::Transform,
    math::Vector,
    render::{Color, Renderer},
};

/// Segment count used when drawing circles.
pub const CIRCLE_SEGMENTS: u32 = 16;

/// The primitive a [`Render`] component draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Axis aligned rectangle with its top left corner at the position.
    Rectangle,
    /// Circle inscribed in the `size` box anchored at the position.
    Circle,
    /// Line from the position to `position + size`.
    Line,
}

/// Visual description of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Render {
    shape: Shape,
    size: Vector,
    color: Color,
    visible: bool,
}

impl Render {
    pub fn new(shape: Shape, size: Vector, color: Color) -> Self {
        Self {
            shape,
            size,
            color,
            visible: true,
        }
    }

    /// A rectangle of the given size.
    pub fn rect(size: Vector, color: Color) -> Self {
        Self::new(Shape::Rectangle, size, color)
    }

    /// A circle filling a square of side `diameter`.
    pub fn circle(diameter: f32, color: Color) -> Self {
        Self::new(Shape::Circle, Vector::new(diameter, diameter), color)
    }

    /// Draw this component at the transform's position. Invisible components and entities without
    /// a transform draw nothing.
    pub fn draw(&self, transform: Option<&Transform>, renderer: &mut dyn Renderer) {
        if !self.visible {
            return;
        }
        let Some(transform) = transform else {
            return;
        };

        let position = transform.position();
        let color = self.color;
        match self.shape {
            Shape::Rectangle => {
                renderer.draw_rect(position.x, position.y, self.size.x, self.size.y, color)
            }
            Shape::Circle => renderer.draw_circle(
                position.x + self.size.x / 2.0,
                position.y + self.size.y / 2.0,
                self.size.x / 2.0,
                CIRCLE_SEGMENTS,
                color,
            ),
            Shape::Line => renderer.draw_line(
                position.x,
                position.y,
                position.x + self.size.x,
                position.y + self.size.y,
                color,
            ),
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn size(&self) -> Vector {
        self.size
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: Vector) {
        self.size = size;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Default for Render {
    fn default() -> Self {
        Self::rect(Vector::new(20.0, 20.0), Color::WHITE)
    }
}
