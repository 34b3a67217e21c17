//! Per-role behavior. Each function touches only the entity it is given, so the dispatcher may run
//! them for different entities on different workers.

use crate::{
    config::{ArenaConfig, GameplayConfig},
    ecs::{
        component::{Physics, Transform},
        entity,
    },
    input::{InputState, buttons, keys},
    math::Vector,
};

/// The unit direction the held movement keys point to, or zero.
pub fn movement_direction(input: &InputState) -> Vector {
    let mut direction = Vector::ZERO;
    if input.any_pressed(&[keys::W, keys::UP]) {
        direction.y -= 1.0;
    }
    if input.any_pressed(&[keys::S, keys::DOWN]) {
        direction.y += 1.0;
    }
    if input.any_pressed(&[keys::A, keys::LEFT]) {
        direction.x -= 1.0;
    }
    if input.any_pressed(&[keys::D, keys::RIGHT]) {
        direction.x += 1.0;
    }
    direction.normalize()
}

/// Whether the input asks to fire.
pub fn wants_to_fire(input: &InputState) -> bool {
    input.is_key_pressed(keys::SPACE) || input.is_mouse_button_pressed(buttons::LEFT)
}

/// Apply the movement keys to the player and keep it inside the arena.
///
/// Holding a direction sets the velocity outright. Releasing every key leaves the velocity to
/// friction.
pub fn control_player(
    player: &entity::Ref,
    input: &InputState,
    gameplay: &GameplayConfig,
    arena: &ArenaConfig,
) {
    let direction = movement_direction(input);
    let max = Vector::new(
        (arena.width - gameplay.player_size).max(0.0),
        (arena.height - gameplay.player_size).max(0.0),
    );
    player.write_components(|set| {
        if direction != Vector::ZERO {
            if let Some(physics) = set.get_mut::<Physics>() {
                physics.set_velocity(direction * gameplay.player_speed);
            }
        }
        if let Some(transform) = set.get_mut::<Transform>() {
            let clamped = transform.position().clamp(Vector::ZERO, max);
            transform.move_to(clamped);
        }
    });
}

/// Unit direction from `from` towards `to`. Aiming at the point itself fires along +x.
pub fn aim(from: Vector, to: Vector) -> Vector {
    let direction = (to - from).normalize();
    if direction == Vector::ZERO {
        Vector::UNIT_X
    } else {
        direction
    }
}

/// Retire the entity if it has left the arena. Returns true only if this call retired it.
pub fn retire_out_of_bounds(entity: &entity::Ref, arena: &ArenaConfig) -> bool {
    match entity.position() {
        Some(position) if !arena.contains(position) => entity.destroy(),
        _ => false,
    }
}

/// Turn a pursuer towards `target`, closing a `pursuer_steering * dt` share of the gap between its
/// velocity and full speed straight at the target. Returns the new velocity.
pub fn steer_pursuer(
    pursuer: &entity::Ref,
    target: Vector,
    gameplay: &GameplayConfig,
    dt: f32,
) -> Option<Vector> {
    if !pursuer.is_active() {
        return None;
    }
    let position = pursuer.position()?;
    let desired = (target - position).normalize() * gameplay.pursuer_speed;
    let blend = (gameplay.pursuer_steering * dt).clamp(0.0, 1.0);

    pursuer.write::<Physics, _>(|physics| {
        let velocity = physics.velocity();
        let steered = velocity + (desired - velocity) * blend;
        physics.set_velocity(steered);
        steered
    })
}

/// Keep a square of side `size` inside the arena. A velocity component heading into a wall it
/// touches is reversed and the position is clamped back in. Returns true if the entity bounced.
pub fn bounce_off_walls(entity: &entity::Ref, arena: &ArenaConfig, size: f32) -> bool {
    let max = Vector::new((arena.width - size).max(0.0), (arena.height - size).max(0.0));
    entity.write_components(|set| {
        let Some(position) = set.get::<Transform>().map(|t| t.position()) else {
            return false;
        };
        let mut bounced = false;
        if let Some(physics) = set.get_mut::<Physics>() {
            let mut velocity = physics.velocity();
            if into_wall(position.x, velocity.x, max.x) {
                velocity.x = -velocity.x;
                bounced = true;
            }
            if into_wall(position.y, velocity.y, max.y) {
                velocity.y = -velocity.y;
                bounced = true;
            }
            physics.set_velocity(velocity);
        }
        if let Some(transform) = set.get_mut::<Transform>() {
            transform.move_to(position.clamp(Vector::ZERO, max));
        }
        bounced
    })
}

fn into_wall(position: f32, velocity: f32, max: f32) -> bool {
    (position <= 0.0 && velocity < 0.0) || (position >= max && velocity > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecs::entity::Role,
        game::spawn,
    };

    fn held(codes: &[u32]) -> InputState {
        let mut input = InputState::new();
        for &code in codes {
            input.press(code);
        }
        input
    }

    #[test]
    fn test_movement_direction_is_normalized() {
        assert_eq!(movement_direction(&held(&[])), Vector::ZERO);
        assert_eq!(movement_direction(&held(&[keys::UP])), Vector::new(0.0, -1.0));

        let diagonal = movement_direction(&held(&[keys::W, keys::D]));
        assert!((diagonal.magnitude() - 1.0).abs() < 1e-6);
        assert!(diagonal.x > 0.0 && diagonal.y < 0.0);

        // Opposite keys cancel out
        assert_eq!(movement_direction(&held(&[keys::A, keys::D])), Vector::ZERO);
    }

    #[test]
    fn test_control_player_sets_velocity_and_clamps() {
        let gameplay = GameplayConfig::default();
        let arena = ArenaConfig::default();
        let player = spawn::player(&gameplay, Vector::new(900.0, -5.0)).into_ref();

        control_player(&player, &held(&[keys::RIGHT]), &gameplay, &arena);

        assert_eq!(player.position(), Some(Vector::new(780.0, 0.0)));
        assert_eq!(
            player.get::<Physics>().map(|p| p.velocity()),
            Some(Vector::new(200.0, 0.0))
        );
    }

    #[test]
    fn test_released_keys_keep_velocity() {
        let gameplay = GameplayConfig::default();
        let player = spawn::player(&gameplay, Vector::new(100.0, 100.0)).into_ref();
        player.write::<Physics, _>(|p| p.set_velocity(Vector::new(5.0, 0.0)));

        control_player(&player, &InputState::new(), &gameplay, &ArenaConfig::default());

        assert_eq!(
            player.get::<Physics>().map(|p| p.velocity()),
            Some(Vector::new(5.0, 0.0))
        );
    }

    #[test]
    fn test_fire_inputs() {
        assert!(wants_to_fire(&held(&[keys::SPACE])));
        let mut mouse = InputState::new();
        mouse.press_button(buttons::LEFT);
        assert!(wants_to_fire(&mouse));
        assert!(!wants_to_fire(&held(&[keys::W])));
    }

    #[test]
    fn test_aim() {
        assert_eq!(aim(Vector::ZERO, Vector::new(0.0, 10.0)), Vector::new(0.0, 1.0));
        assert_eq!(aim(Vector::new(3.0, 3.0), Vector::new(3.0, 3.0)), Vector::UNIT_X);
    }

    #[test]
    fn test_out_of_bounds_retires_once() {
        let arena = ArenaConfig::default();
        let inside = spawn::decoration(Vector::new(10.0, 10.0)).into_ref();
        let outside = spawn::decoration(Vector::new(-1.0, 10.0)).into_ref();

        assert!(!retire_out_of_bounds(&inside, &arena));
        assert!(retire_out_of_bounds(&outside, &arena));
        assert!(!retire_out_of_bounds(&outside, &arena));
        assert_eq!(outside.role(), Role::Decoration);
    }

    #[test]
    fn test_steering_turns_towards_target() {
        let gameplay = GameplayConfig {
            pursuer_steering: 10.0,
            ..Default::default()
        };
        let pursuer = spawn::pursuer(Vector::ZERO, Vector::new(0.0, 50.0)).into_ref();

        // A full blend points straight at the target at full speed
        let velocity = steer_pursuer(&pursuer, Vector::new(100.0, 0.0), &gameplay, 0.1);
        assert_eq!(velocity, Some(Vector::new(80.0, 0.0)));

        // A partial blend moves part of the way
        let gameplay = GameplayConfig::default();
        let pursuer = spawn::pursuer(Vector::ZERO, Vector::ZERO).into_ref();
        let velocity = steer_pursuer(&pursuer, Vector::new(100.0, 0.0), &gameplay, 0.25);
        assert_eq!(velocity, Some(Vector::new(40.0, 0.0)));

        pursuer.destroy();
        assert_eq!(steer_pursuer(&pursuer, Vector::ZERO, &gameplay, 0.1), None);
    }

    #[test]
    fn test_pursuers_bounce_off_each_wall() {
        let arena = ArenaConfig::default();
        let size = spawn::PURSUER_SIZE;
        let v = Vector::new;
        // (position, velocity, clamped position, reflected velocity) for left, right, top, bottom
        let cases = [
            (v(-4.0, 300.0), v(-30.0, 5.0), v(0.0, 300.0), v(30.0, 5.0)),
            (v(790.0, 300.0), v(30.0, 5.0), v(780.0, 300.0), v(-30.0, 5.0)),
            (v(400.0, -2.0), v(5.0, -30.0), v(400.0, 0.0), v(5.0, 30.0)),
            (v(400.0, 600.0), v(5.0, 30.0), v(400.0, 580.0), v(5.0, -30.0)),
        ];

        for (position, velocity, clamped, reflected) in cases {
            let pursuer = spawn::pursuer(position, velocity).into_ref();
            assert!(bounce_off_walls(&pursuer, &arena, size));
            assert_eq!(pursuer.position(), Some(clamped));
            assert_eq!(pursuer.get::<Physics>().map(|p| p.velocity()), Some(reflected));
        }
    }

    #[test]
    fn test_no_bounce_inside_or_when_leaving_a_wall() {
        let arena = ArenaConfig::default();

        let inside = spawn::pursuer(Vector::new(400.0, 300.0), Vector::new(-30.0, 30.0)).into_ref();
        assert!(!bounce_off_walls(&inside, &arena, spawn::PURSUER_SIZE));
        assert_eq!(
            inside.get::<Physics>().map(|p| p.velocity()),
            Some(Vector::new(-30.0, 30.0))
        );

        // Freshly spawned on the left edge and heading in
        let entering = spawn::pursuer(Vector::new(0.0, 300.0), Vector::new(30.0, 0.0)).into_ref();
        assert!(!bounce_off_walls(&entering, &arena, spawn::PURSUER_SIZE));
        assert_eq!(
            entering.get::<Physics>().map(|p| p.velocity()),
            Some(Vector::new(30.0, 0.0))
        );
    }
}
