use crate::math::Vector;

/// Position, scale and rotation of an entity in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vector,
    scale: Vector,
    rotation: f32,
}

impl Transform {
    /// Construct a transform at the origin with unit scale.
    pub fn new() -> Self {
        Self {
            position: Vector::ZERO,
            scale: Vector::new(1.0, 1.0),
            rotation: 0.0,
        }
    }

    /// Construct a transform at the given position.
    pub fn at(position: Vector) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    /// Construct a transform from all of its parts.
    pub fn from_parts(position: Vector, scale: Vector, rotation: f32) -> Self {
        Self {
            position,
            scale,
            rotation,
        }
    }

    #[inline]
    pub fn position(&self) -> Vector {
        self.position
    }

    #[inline]
    pub fn scale(&self) -> Vector {
        self.scale
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Move to an absolute position.
    pub fn move_to(&mut self, position: Vector) {
        self.position = position;
    }

    /// Move by a relative offset.
    pub fn translate(&mut self, delta: Vector) {
        self.position += delta;
    }

    /// Rotate by a relative angle in radians.
    pub fn rotate(&mut self, angle: f32) {
        self.rotation += angle;
    }

    pub fn set_rotation(&mut self, angle: f32) {
        self.rotation = angle;
    }

    /// Multiply the current scale component-wise.
    pub fn scale_by(&mut self, factor: Vector) {
        self.scale = Vector::new(self.scale.x * factor.x, self.scale.y * factor.y);
    }

    pub fn set_scale(&mut self, scale: Vector) {
        self.scale = scale;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
