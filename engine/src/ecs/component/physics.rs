use crate::{ecs::component::Transform, math::Vector};

/// Smallest mass a body may have. Mass is clamped up to this value so forces never divide by zero.
pub const MIN_MASS: f32 = 0.1;

/// Default gravity applied when `use_gravity` is enabled.
pub const DEFAULT_GRAVITY: Vector = Vector::new(0.0, 9.8);

/// Rigid body motion for an entity.
///
/// Integration needs the entity's [`Transform`]. Without one, [`Physics::integrate`] does nothing.
///
/// Each step runs in a fixed order:
///
/// 1. add gravity into the acceleration (when enabled)
/// 2. `velocity += acceleration * dt`
/// 3. `velocity *= friction`
/// 4. `position += velocity * dt`
/// 5. reset the acceleration to zero
///
/// Forces do not persist between steps. [`apply_force`](Physics::apply_force) has to be called
/// every tick for a continuing effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Physics {
    velocity: Vector,
    acceleration: Vector,
    mass: f32,
    friction: f32,
    use_gravity: bool,
    gravity: Vector,
}

impl Physics {
    /// Construct a body with the given mass (clamped to [`MIN_MASS`]).
    pub fn new(mass: f32) -> Self {
        Self {
            velocity: Vector::ZERO,
            acceleration: Vector::ZERO,
            mass: mass.max(MIN_MASS),
            friction: 0.9,
            use_gravity: false,
            gravity: DEFAULT_GRAVITY,
        }
    }

    /// Builder form of [`set_friction`](Physics::set_friction).
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.set_friction(friction);
        self
    }

    /// Builder form of [`set_velocity`](Physics::set_velocity).
    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    /// Advance one step, moving `transform`. A missing transform makes this a no-op.
    pub fn integrate(&mut self, dt: f32, transform: Option<&mut Transform>) {
        let Some(transform) = transform else {
            return;
        };

        if self.use_gravity {
            self.acceleration += self.gravity;
        }
        self.velocity += self.acceleration * dt;
        self.velocity = self.velocity * self.friction;
        transform.translate(self.velocity * dt);
        self.acceleration = Vector::ZERO;
    }

    /// Accumulate a force for the next step.
    pub fn apply_force(&mut self, force: Vector) {
        self.acceleration += force * (1.0 / self.mass);
    }

    /// Change the velocity immediately.
    pub fn apply_impulse(&mut self, impulse: Vector) {
        self.velocity += impulse * (1.0 / self.mass);
    }

    pub fn set_velocity(&mut self, velocity: Vector) {
        self.velocity = velocity;
    }

    pub fn add_velocity(&mut self, delta: Vector) {
        self.velocity += delta;
    }

    pub fn set_gravity(&mut self, gravity: Vector) {
        self.gravity = gravity;
    }

    pub fn set_use_gravity(&mut self, use_gravity: bool) {
        self.use_gravity = use_gravity;
    }

    /// Set the friction factor, clamped to `[0, 1]`. `1` keeps velocity, `0` stops the body.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction.clamp(0.0, 1.0);
    }

    /// Set the mass, clamped to at least [`MIN_MASS`].
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass.max(MIN_MASS);
    }

    #[inline]
    pub fn velocity(&self) -> Vector {
        self.velocity
    }

    #[inline]
    pub fn acceleration(&self) -> Vector {
        self.acceleration
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    #[inline]
    pub fn uses_gravity(&self) -> bool {
        self.use_gravity
    }

    #[inline]
    pub fn gravity(&self) -> Vector {
        self.gravity
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(1.0)
    }
}
