//! Tunables for a simulation run.
//!
//! Every struct implements `Default` with the values the game ships with, so callers override only
//! what they care about:
//!
//! ```ignore
//! let config = Config {
//!     seed: 7,
//!     dispatch: DispatchConfig { workers: 8, ..Default::default() },
//!     ..Default::default()
//! };
//! ```

use crate::math::Vector;

pub use crate::ecs::dispatch::DispatchConfig;

/// Full configuration for a [`Simulation`](crate::game::Simulation).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub arena: ArenaConfig,
    pub dispatch: DispatchConfig,
    pub gameplay: GameplayConfig,
    /// Seed for spawn positions and initial velocities.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            dispatch: DispatchConfig::default(),
            gameplay: GameplayConfig::default(),
            seed: 42,
        }
    }
}

/// The playing field, in world units with the origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
}

impl ArenaConfig {
    pub fn center(&self) -> Vector {
        Vector::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether a point lies inside the arena, edges included.
    pub fn contains(&self, point: Vector) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Game rules.
#[derive(Debug, Clone, PartialEq)]
pub struct GameplayConfig {
    /// Projectile to pursuer hit distance.
    pub hit_radius: f32,
    /// Player to pursuer defeat distance.
    pub player_hit_radius: f32,
    pub points_per_hit: u32,
    /// Side length of the player square.
    pub player_size: f32,
    /// Speed given to the player while a direction key is held.
    pub player_speed: f32,
    pub projectile_speed: f32,
    pub projectile_size: f32,
    /// Minimum time between two shots, in seconds.
    pub fire_cooldown: f32,
    pub pursuer_speed: f32,
    /// How quickly a pursuer turns toward the player, as a fraction of the gap closed per second.
    pub pursuer_steering: f32,
    /// Time between pursuer spawns, in seconds.
    pub spawn_interval: f32,
    pub initial_pursuers: usize,
    pub decorations: usize,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            hit_radius: 25.0,
            player_hit_radius: 20.0,
            points_per_hit: 10,
            player_size: 20.0,
            player_speed: 200.0,
            projectile_speed: 400.0,
            projectile_size: 6.0,
            fire_cooldown: 0.2,
            pursuer_speed: 80.0,
            pursuer_steering: 2.0,
            spawn_interval: 2.0,
            initial_pursuers: 3,
            decorations: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_contains_edges() {
        let arena = ArenaConfig::default();
        assert!(arena.contains(Vector::new(0.0, 0.0)));
        assert!(arena.contains(Vector::new(800.0, 600.0)));
        assert!(!arena.contains(Vector::new(-0.1, 10.0)));
        assert!(!arena.contains(Vector::new(10.0, 600.1)));
        assert_eq!(arena.center(), Vector::new(400.0, 300.0));
    }
}
