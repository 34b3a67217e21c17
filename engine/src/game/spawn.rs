//! Entity factories for each role.

use rand::Rng;

use crate::{
    config::{ArenaConfig, GameplayConfig},
    ecs::{
        component::{Physics, Render, Transform},
        entity::{Entity, Role},
    },
    math::Vector,
    render::Color,
};

pub const PLAYER_COLOR: Color = Color::rgb(0.0, 1.0, 0.0);
pub const PURSUER_COLOR: Color = Color::rgb(1.0, 0.5, 0.0);
pub const PROJECTILE_COLOR: Color = Color::rgb(1.0, 1.0, 0.3);
pub const DECORATION_COLOR: Color = Color::rgba(0.5, 0.5, 1.0, 0.8);

pub const PURSUER_SIZE: f32 = 20.0;
pub const DECORATION_SIZE: f32 = 5.0;

/// Largest speed along each axis given to a freshly spawned pursuer.
const DRIFT: f32 = 50.0;

pub fn player(gameplay: &GameplayConfig, position: Vector) -> Entity {
    Entity::new("Player", Role::Player)
        .with(Transform::at(position))
        .with(Render::rect(
            Vector::new(gameplay.player_size, gameplay.player_size),
            PLAYER_COLOR,
        ))
        .with(Physics::new(1.0).with_friction(0.95))
}

pub fn pursuer(position: Vector, velocity: Vector) -> Entity {
    Entity::new("Pursuer", Role::Pursuer)
        .with(Transform::at(position))
        .with(Render::rect(
            Vector::new(PURSUER_SIZE, PURSUER_SIZE),
            PURSUER_COLOR,
        ))
        .with(Physics::new(0.5).with_friction(0.98).with_velocity(velocity))
}

/// A projectile whose circle is centered on `center`.
pub fn projectile(gameplay: &GameplayConfig, center: Vector, velocity: Vector) -> Entity {
    let size = gameplay.projectile_size;
    Entity::new("Projectile", Role::Projectile)
        .with(Transform::at(center - Vector::new(size, size) * 0.5))
        .with(Render::circle(size, PROJECTILE_COLOR))
        .with(Physics::new(0.1).with_friction(1.0).with_velocity(velocity))
}

pub fn decoration(position: Vector) -> Entity {
    Entity::new("Decoration", Role::Decoration)
        .with(Transform::at(position))
        .with(Render::circle(DECORATION_SIZE, DECORATION_COLOR))
}

/// A uniformly random point inside the arena.
pub fn random_position(rng: &mut impl Rng, arena: &ArenaConfig) -> Vector {
    Vector::new(
        rng.gen_range(0.0..arena.width),
        rng.gen_range(0.0..arena.height),
    )
}

/// A random point on one of the four arena edges, inset so a square of side `size` stays inside.
pub fn edge_position(rng: &mut impl Rng, arena: &ArenaConfig, size: f32) -> Vector {
    let max_x = (arena.width - size).max(0.0);
    let max_y = (arena.height - size).max(0.0);
    let along_x = rng.gen_range(0.0..=max_x);
    let along_y = rng.gen_range(0.0..=max_y);
    match rng.gen_range(0..4) {
        0 => Vector::new(along_x, 0.0),
        1 => Vector::new(max_x, along_y),
        2 => Vector::new(along_x, max_y),
        _ => Vector::new(0.0, along_y),
    }
}

/// A small random velocity.
pub fn drift_velocity(rng: &mut impl Rng) -> Vector {
    Vector::new(rng.gen_range(-DRIFT..DRIFT), rng.gen_range(-DRIFT..DRIFT))
}
