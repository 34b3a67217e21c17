//! Components attached to entities.
//!
//! The component set is closed: every component is one of the variants of [`Component`] and is
//! identified at runtime by its [`Kind`]. Typed access goes through the [`Typed`] trait, which maps
//! a concrete component type to its kind at compile time, so lookups never need runtime type
//! tests.
//!
//! ## Architecture
//!
//! - [`Transform`]: position, scale and rotation
//! - [`Physics`]: velocity, forces, friction and gravity integration
//! - [`Render`]: shape, size and color drawn through a [`Renderer`](crate::render::Renderer)
//! - [`Set`]: the per-entity container holding at most one component of each kind, in attach order
//!
//! ## Usage
//!
//! ```ignore
//! use volley_engine::ecs::component::{Physics, Set, Transform};
//!
//! let mut set = Set::new(owner);
//! set.attach(Transform::at(Vector::new(400.0, 300.0)));
//! set.attach(Physics::new(1.0).with_friction(0.95));
//! set.update(0.1);
//! ```

use std::fmt;

mod physics;
mod render;
mod set;
mod transform;

pub use physics::{DEFAULT_GRAVITY, MIN_MASS, Physics};
pub use render::{CIRCLE_SEGMENTS, Render, Shape};
pub use set::Set;
pub use transform::Transform;

/// The kind of a component. Each entity holds at most one component of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Transform,
    Physics,
    Render,
}

impl Kind {
    /// Number of component kinds.
    pub const COUNT: usize = 3;

    /// Every kind, in index order.
    pub const ALL: [Kind; Self::COUNT] = [Kind::Transform, Kind::Physics, Kind::Render];

    /// Get the index of this kind if it were to live in indexable storage (e.g. an array)
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Kind::Transform => 0,
            Kind::Physics => 1,
            Kind::Render => 2,
        }
    }

    /// Human readable name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Transform => "Transform",
            Kind::Physics => "Physics",
            Kind::Render => "Render",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component value of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Transform(Transform),
    Physics(Physics),
    Render(Render),
}

impl Component {
    /// The kind of this component.
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            Component::Transform(_) => Kind::Transform,
            Component::Physics(_) => Kind::Physics,
            Component::Render(_) => Kind::Render,
        }
    }
}

/// A concrete component type with a kind known at compile time.
pub trait Typed: Sized + 'static {
    /// The kind of this component type.
    const KIND: Kind;

    /// Wrap this value in the closed [`Component`] type.
    fn into_component(self) -> Component;

    /// Borrow the concrete value out of a component of the matching kind.
    fn from_component(component: &Component) -> Option<&Self>;

    /// Mutably borrow the concrete value out of a component of the matching kind.
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

/// Implement [`Typed`] for a component type whose [`Component`] variant shares its name.
macro_rules! typed_component {
    ($($name: ident),*) => {
        $(
            impl Typed for $name {
                const KIND: Kind = Kind::$name;

                #[inline]
                fn into_component(self) -> Component {
                    Component::$name(self)
                }

                #[inline]
                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$name(value) => Some(value),
                        _ => None,
                    }
                }

                #[inline]
                fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$name(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl From<$name> for Component {
                fn from(value: $name) -> Self {
                    Component::$name(value)
                }
            }
        )*
    };
}

typed_component!(Transform, Physics, Render);
