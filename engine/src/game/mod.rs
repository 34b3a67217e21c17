//! The arena game: a player dodging pursuers and shooting them down.
//!
//! [`Simulation`] owns the scene, the projectile and pursuer group buffers and the dispatcher that
//! runs the per-group phases. One call to [`Simulation::tick`] runs the phases in a fixed order:
//!
//! 1. commit and update the scene
//! 2. promote newly live projectiles and pursuers into their groups
//! 3. apply player input (movement, firing)
//! 4. retire projectiles that left the arena (dispatched), compact
//! 5. steer pursuers towards the player and bounce them off the walls (dispatched), compact
//! 6. resolve projectile/pursuer collisions (dispatched detection), compact
//! 7. check the player against every pursuer
//! 8. run the spawn timer
//! 9. sweep entities retired this tick out of the scene
//!
//! Once the player is defeated ticks do nothing, but rendering still shows the final score.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    config::Config,
    core::Logic,
    ecs::{
        dispatch::{BatchError, Dispatcher, Group, Mode, Pool, collision},
        entity::{self, Role},
        scene::{Commit, Scene},
    },
    input::InputState,
    math::Vector,
    render::{Color, Renderer},
};

mod events;
pub mod spawn;
pub mod systems;

pub use events::{EVENT_CAPACITY, Events, GameEvent};

pub const BACKGROUND_COLOR: Color = Color::rgb(0.1, 0.1, 0.2);
pub const BANNER_COLOR: Color = Color::rgb(1.0, 0.2, 0.2);

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Ticks simulated so far, including this one.
    pub tick: u64,
    /// True when the tick was skipped because the player is defeated.
    pub frozen: bool,
    pub committed: Commit,
    /// How the projectile and pursuer phases ran, when their groups were not empty.
    pub projectile_mode: Option<Mode>,
    pub pursuer_mode: Option<Mode>,
    pub hits: usize,
    pub expired: usize,
    pub score: u32,
    /// Every batch that failed during the tick.
    pub failures: Vec<BatchError>,
}

pub struct Simulation {
    config: Config,
    scene: Scene,
    dispatcher: Dispatcher,
    rng: ChaCha8Rng,
    player: Option<entity::Ref>,
    projectiles: Group,
    pursuers: Group,
    /// Spawned this tick, waiting for the scene to commit them.
    pending: Vec<entity::Ref>,
    events: Events,
    score: u32,
    defeated: bool,
    spawn_timer: f32,
    fire_cooldown: f32,
    ticks: u64,
    failures: usize,
    finish_on_defeat: bool,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        Self {
            scene: Scene::new("arena"),
            dispatcher: Dispatcher::new(config.dispatch),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            player: None,
            projectiles: Group::new("projectiles"),
            pursuers: Group::new("pursuers"),
            pending: Vec::new(),
            events: Events::new(),
            score: 0,
            defeated: false,
            spawn_timer: 0.0,
            fire_cooldown: 0.0,
            ticks: 0,
            failures: 0,
            finish_on_defeat: false,
            config,
        }
    }

    /// Make [`Logic::is_finished`] report true once the player is defeated.
    pub fn finish_on_defeat(mut self, finish: bool) -> Self {
        self.finish_on_defeat = finish;
        self
    }

    /// Spawn the player, the initial pursuers and the decorations, and initialize the scene. Only
    /// the first call does anything.
    pub fn initialize(&mut self) {
        if self.scene.is_initialized() {
            return;
        }

        let gameplay = &self.config.gameplay;
        let start = self.config.arena.center();
        let player = spawn::player(gameplay, start).into_ref();
        self.scene.add_entity(Arc::clone(&player));
        self.player = Some(player);

        for _ in 0..gameplay.initial_pursuers {
            self.spawn_random_pursuer();
        }
        for _ in 0..self.config.gameplay.decorations {
            let position = spawn::random_position(&mut self.rng, &self.config.arena);
            self.scene.add_entity(spawn::decoration(position).into_ref());
        }

        self.scene.initialize();
    }

    /// Advance the game by `dt` seconds with the given input snapshot.
    pub fn tick(&mut self, input: &InputState, dt: f32) -> TickReport {
        if self.defeated {
            return TickReport {
                tick: self.ticks,
                frozen: true,
                score: self.score,
                ..Default::default()
            };
        }
        self.ticks += 1;

        let committed = self.scene.update(dt);
        self.promote();

        if let Some(player) = self.player.clone() {
            systems::control_player(&player, input, &self.config.gameplay, &self.config.arena);
            self.fire(&player, input, dt);
        }

        let mut failures = Vec::new();

        let arena = self.config.arena;
        let bounds = self.dispatcher.run(
            Pool::Movement,
            "projectile bounds",
            self.projectiles.members(),
            |projectile| systems::retire_out_of_bounds(projectile, &arena),
        );
        let mut expired = 0;
        for (index, _) in bounds.completed().filter(|(_, retired)| **retired) {
            expired += 1;
            self.events.push(GameEvent::ProjectileExpired {
                projectile: self.projectiles[index].id(),
            });
        }
        let projectile_mode = (bounds.batches > 0).then_some(bounds.mode);
        failures.extend(bounds.failures);
        self.projectiles.compact();

        let target = self.player_center();
        let gameplay = &self.config.gameplay;
        let steering = self.dispatcher.run(
            Pool::Movement,
            "pursuer steering",
            self.pursuers.members(),
            |pursuer| {
                let velocity = systems::steer_pursuer(pursuer, target, gameplay, dt);
                systems::bounce_off_walls(pursuer, &arena, spawn::PURSUER_SIZE);
                velocity
            },
        );
        let pursuer_mode = (steering.batches > 0).then_some(steering.mode);
        failures.extend(steering.failures);
        self.pursuers.compact();

        let resolution = collision::resolve(
            &self.dispatcher,
            &mut self.projectiles,
            &mut self.pursuers,
            self.config.gameplay.hit_radius,
        );
        for hit in &resolution.hits {
            self.score = self.score.saturating_add(self.config.gameplay.points_per_hit);
            self.events.push(GameEvent::PursuerDestroyed {
                pursuer: hit.pursuer.id(),
                projectile: hit.projectile.id(),
                score: self.score,
            });
        }
        failures.extend(resolution.failures);

        self.check_player();
        self.run_spawn_timer(dt);
        self.scene.sweep();

        self.failures += failures.len();
        TickReport {
            tick: self.ticks,
            frozen: false,
            committed,
            projectile_mode,
            pursuer_mode,
            hits: resolution.hits.len(),
            expired,
            score: self.score,
            failures,
        }
    }

    /// Draw the background, every live entity and the HUD.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        let arena = &self.config.arena;
        renderer.draw_rect(0.0, 0.0, arena.width, arena.height, BACKGROUND_COLOR);
        self.scene.render(renderer);
        renderer.draw_text(
            &format!("Score: {}  Pursuers: {}", self.score, self.pursuers.len()),
            10.0,
            20.0,
            Color::WHITE,
        );
        if self.defeated {
            let center = arena.center();
            renderer.draw_text("GAME OVER", center.x - 40.0, center.y, BANNER_COLOR);
        }
    }

    /// Queue a projectile centered on `center`. It joins the projectile group next tick.
    pub fn spawn_projectile(&mut self, center: Vector, velocity: Vector) -> entity::Ref {
        let projectile = spawn::projectile(&self.config.gameplay, center, velocity).into_ref();
        self.queue(Arc::clone(&projectile));
        projectile
    }

    /// Queue a pursuer at `position`. It joins the pursuer group next tick.
    pub fn spawn_pursuer(&mut self, position: Vector, velocity: Vector) -> entity::Ref {
        let pursuer = spawn::pursuer(position, velocity).into_ref();
        self.queue(Arc::clone(&pursuer));
        self.events.push(GameEvent::PursuerSpawned {
            pursuer: pursuer.id(),
            position,
        });
        pursuer
    }

    fn spawn_random_pursuer(&mut self) -> entity::Ref {
        let position = spawn::edge_position(&mut self.rng, &self.config.arena, spawn::PURSUER_SIZE);
        let velocity = spawn::drift_velocity(&mut self.rng);
        self.spawn_pursuer(position, velocity)
    }

    fn queue(&mut self, entity: entity::Ref) {
        self.scene.add_entity(Arc::clone(&entity));
        self.pending.push(entity);
    }

    /// Move entities the scene committed this tick into their groups.
    fn promote(&mut self) {
        for entity in self.pending.drain(..) {
            if !entity.is_active() {
                continue;
            }
            match entity.role() {
                Role::Projectile => self.projectiles.push(entity),
                Role::Pursuer => self.pursuers.push(entity),
                Role::Player | Role::Decoration | Role::Prop => {}
            }
        }
    }

    fn fire(&mut self, player: &entity::Ref, input: &InputState, dt: f32) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        if self.fire_cooldown > 0.0 || !systems::wants_to_fire(input) {
            return;
        }
        let Some(origin) = self.center_of(player) else {
            return;
        };

        let direction = systems::aim(origin, input.mouse_position());
        let projectile =
            self.spawn_projectile(origin, direction * self.config.gameplay.projectile_speed);
        self.fire_cooldown = self.config.gameplay.fire_cooldown;
        self.events.push(GameEvent::ProjectileFired {
            projectile: projectile.id(),
            direction,
        });
    }

    fn check_player(&mut self) {
        let Some(position) = self.player.as_ref().and_then(|player| player.position()) else {
            return;
        };
        let radius = self.config.gameplay.player_hit_radius;
        if let Some(pursuer) = collision::first_within(position, &self.pursuers, radius) {
            self.defeated = true;
            self.events.push(GameEvent::PlayerDefeated {
                by: pursuer.id(),
                score: self.score,
            });
        }
    }

    fn run_spawn_timer(&mut self, dt: f32) {
        let interval = self.config.gameplay.spawn_interval;
        if interval <= 0.0 {
            return;
        }
        self.spawn_timer += dt;
        while self.spawn_timer >= interval {
            self.spawn_timer -= interval;
            self.spawn_random_pursuer();
        }
    }

    fn center_of(&self, entity: &entity::Ref) -> Option<Vector> {
        let half = self.config.gameplay.player_size / 2.0;
        entity.position().map(|p| p + Vector::new(half, half))
    }

    fn player_center(&self) -> Vector {
        self.player
            .as_ref()
            .and_then(|player| self.center_of(player))
            .unwrap_or_else(|| self.config.arena.center())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn player(&self) -> Option<&entity::Ref> {
        self.player.as_ref()
    }

    pub fn projectiles(&self) -> &Group {
        &self.projectiles
    }

    pub fn pursuers(&self) -> &Group {
        &self.pursuers
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Batch failures seen since the start.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Events raised since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Stop the worker pools.
    pub fn shutdown(self) {
        self.dispatcher.shutdown();
    }
}

impl Logic for Simulation {
    fn on_init(&mut self) {
        self.initialize();
    }

    fn on_fixed_update(&mut self, input: &InputState, dt: f32) {
        self.tick(input, dt);
    }

    fn on_render(&self, renderer: &mut dyn Renderer) {
        self.render(renderer);
    }

    fn is_finished(&self) -> bool {
        self.finish_on_defeat && self.defeated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DispatchConfig, GameplayConfig},
        ecs::component::{Kind, Physics},
        input::keys,
        render::{DrawCommand, Recorder},
    };

    const DT: f32 = 0.1;

    /// A quiet arena: no random pursuers, no decorations, no spawn timer.
    fn quiet(threshold: usize) -> Simulation {
        let mut sim = Simulation::new(Config {
            dispatch: DispatchConfig {
                threshold,
                workers: 4,
            },
            gameplay: GameplayConfig {
                initial_pursuers: 0,
                decorations: 0,
                spawn_interval: 0.0,
                ..Default::default()
            },
            ..Default::default()
        });
        sim.initialize();
        sim
    }

    fn idle() -> InputState {
        InputState::new()
    }

    #[test]
    fn test_initialize_populates_scene() {
        let mut sim = Simulation::new(Config::default());
        sim.initialize();
        sim.initialize();

        assert_eq!(sim.scene().pending(), 1 + 3 + 5);
        let report = sim.tick(&idle(), DT);

        assert_eq!(report.committed.added, 9);
        assert_eq!(sim.scene().len(), 9);
        assert_eq!(sim.pursuers().len(), 3);
        assert!(sim.scene().entities().iter().all(|e| e.is_initialized()));
    }

    #[test]
    fn test_projectile_hits_pursuer_once() {
        // Given a projectile 10 units from a pursuer
        let mut sim = quiet(10);
        let projectile = sim.spawn_projectile(Vector::new(100.0, 100.0), Vector::ZERO);
        let pursuer = sim.spawn_pursuer(Vector::new(110.0, 100.0), Vector::ZERO);

        // When a tick commits and resolves them
        let report = sim.tick(&idle(), DT);

        // Then both are removed and the score rises by ten, exactly once
        assert_eq!(report.hits, 1);
        assert_eq!(sim.score(), 10);
        assert!(!projectile.is_active() && !pursuer.is_active());
        assert!(sim.projectiles().is_empty() && sim.pursuers().is_empty());
        assert!(sim.scene().find(projectile.id()).is_none());

        let report = sim.tick(&idle(), DT);
        assert_eq!(report.hits, 0);
        assert_eq!(sim.score(), 10);

        let destroyed = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PursuerDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn test_spawned_entities_go_live_next_tick() {
        let mut sim = quiet(10);
        sim.tick(&idle(), DT);

        let pursuer = sim.spawn_pursuer(Vector::new(10.0, 10.0), Vector::ZERO);
        assert!(!sim.pursuers().contains(pursuer.id()));
        assert!(sim.scene().find(pursuer.id()).is_none());

        sim.tick(&idle(), DT);
        assert!(sim.pursuers().contains(pursuer.id()));
        assert!(sim.scene().find(pursuer.id()).is_some());
    }

    #[test]
    fn test_out_of_bounds_projectile_expires_once() {
        let mut sim = quiet(10);
        let projectile = sim.spawn_projectile(Vector::new(790.0, 300.0), Vector::new(400.0, 0.0));

        let report = sim.tick(&idle(), DT);

        assert_eq!(report.expired, 1);
        assert!(!projectile.is_active());
        assert!(sim.projectiles().is_empty());
        assert!(sim.scene().find(projectile.id()).is_none());

        let report = sim.tick(&idle(), DT);
        assert_eq!(report.expired, 0);
    }

    #[test]
    fn test_many_projectiles_run_in_parallel() {
        let mut sim = quiet(10);
        for i in 0..12 {
            let center = Vector::new(20.0 + i as f32 * 10.0, 580.0);
            sim.spawn_projectile(center, Vector::new(0.0, 300.0));
        }

        let report = sim.tick(&idle(), DT);

        assert_eq!(report.projectile_mode, Some(Mode::Parallel));
        assert_eq!(report.expired, 12);
        assert!(report.failures.is_empty());
        assert!(sim.projectiles().is_empty());
    }

    #[test]
    fn test_pursuers_steer_towards_player() {
        let mut sim = quiet(10);
        let pursuer = sim.spawn_pursuer(Vector::new(100.0, 100.0), Vector::ZERO);
        let player = sim.player().map(Arc::clone).unwrap();
        let distance = || pursuer.position().unwrap().distance(player.position().unwrap());

        sim.tick(&idle(), DT);
        let before = distance();
        for _ in 0..10 {
            sim.tick(&idle(), DT);
        }

        assert!(distance() < before);
        let velocity = pursuer.get::<Physics>().unwrap().velocity();
        assert!(velocity.x > 0.0 && velocity.y > 0.0);
    }

    #[test]
    fn test_pursuer_bounces_off_the_wall() {
        // Given a pursuer already past the left wall and moving further out
        let mut sim = quiet(10);
        let pursuer = sim.spawn_pursuer(Vector::new(-5.0, 300.0), Vector::new(-50.0, 0.0));

        sim.tick(&idle(), DT);

        // Then it is pulled back onto the wall and heads back in
        assert!(pursuer.is_active());
        assert_eq!(pursuer.position().map(|p| p.x), Some(0.0));
        assert!(pursuer.get::<Physics>().unwrap().velocity().x > 0.0);
    }

    #[test]
    fn test_score_saturates() {
        let mut sim = Simulation::new(Config {
            gameplay: GameplayConfig {
                initial_pursuers: 0,
                decorations: 0,
                spawn_interval: 0.0,
                points_per_hit: u32::MAX - 5,
                ..Default::default()
            },
            ..Default::default()
        });
        sim.initialize();
        for x in [100.0, 500.0] {
            sim.spawn_projectile(Vector::new(x, 100.0), Vector::ZERO);
            sim.spawn_pursuer(Vector::new(x + 10.0, 100.0), Vector::ZERO);
        }

        let report = sim.tick(&idle(), DT);

        assert_eq!(report.hits, 2);
        assert_eq!(sim.score(), u32::MAX);
        let last = sim.drain_events().into_iter().rev().find_map(|e| match e {
            GameEvent::PursuerDestroyed { score, .. } => Some(score),
            _ => None,
        });
        assert_eq!(last, Some(u32::MAX));
    }

    #[test]
    fn test_player_moves_and_fires() {
        let mut sim = quiet(10);
        let mut input = InputState::new();
        input.press(keys::D);
        input.press(keys::SPACE);
        input.set_mouse_position(Vector::new(800.0, 310.0));

        sim.tick(&input, DT);
        let fired = sim.drain_events();
        assert!(matches!(
            fired[0],
            GameEvent::ProjectileFired { direction, .. } if direction == Vector::UNIT_X
        ));

        // The cooldown holds the next shot back
        sim.tick(&input, DT);
        assert!(sim.drain_events().is_empty());
        assert_eq!(sim.projectiles().len(), 1);

        let player = sim.player().unwrap();
        assert!(player.position().unwrap().x > 400.0);
    }

    #[test]
    fn test_defeat_freezes_simulation() {
        // Given a pursuer on top of the player
        let mut sim = quiet(10).finish_on_defeat(true);
        sim.spawn_pursuer(Vector::new(405.0, 300.0), Vector::ZERO);

        // When
        sim.tick(&idle(), DT);

        // Then
        assert!(sim.is_defeated());
        assert!(sim.is_finished());
        let player = sim.player().map(Arc::clone).unwrap();
        let frozen_at = player.position();

        let mut input = InputState::new();
        input.press(keys::LEFT);
        let report = sim.tick(&input, DT);
        assert!(report.frozen);
        assert_eq!(player.position(), frozen_at);
        assert_eq!(sim.ticks(), 1);

        // Rendering still shows the score and a banner
        let mut recorder = Recorder::new();
        recorder.begin_frame();
        sim.render(&mut recorder);
        recorder.end_frame();
        let texts: Vec<_> = recorder.texts().collect();
        assert_eq!(texts, vec!["Score: 0  Pursuers: 1", "GAME OVER"]);
    }

    #[test]
    fn test_render_draws_background_first() {
        let mut sim = quiet(10);
        sim.tick(&idle(), DT);

        let mut recorder = Recorder::new();
        recorder.begin_frame();
        sim.render(&mut recorder);
        recorder.end_frame();

        let frame = recorder.last_frame();
        assert_eq!(
            frame[0],
            DrawCommand::Rect {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 600.0,
                color: BACKGROUND_COLOR
            }
        );
        // Background, player, HUD
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn test_spawn_timer() {
        let mut sim = Simulation::new(Config {
            gameplay: GameplayConfig {
                initial_pursuers: 0,
                decorations: 0,
                spawn_interval: 0.25,
                ..Default::default()
            },
            ..Default::default()
        });
        sim.initialize();

        for _ in 0..6 {
            sim.tick(&idle(), DT);
        }

        // Two spawns by t = 0.6, the third is due at 0.75
        let spawned = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PursuerSpawned { .. }))
            .count();
        assert_eq!(spawned, 2);
    }

    #[test]
    fn test_thresholds_do_not_change_the_game() {
        let run = |threshold: usize| {
            let mut sim = Simulation::new(Config {
                seed: 7,
                dispatch: DispatchConfig {
                    threshold,
                    workers: 4,
                },
                gameplay: GameplayConfig {
                    initial_pursuers: 30,
                    ..Default::default()
                },
                ..Default::default()
            });
            sim.initialize();

            let mut input = InputState::new();
            input.press(keys::SPACE);
            input.set_mouse_position(Vector::new(0.0, 0.0));
            for _ in 0..60 {
                sim.tick(&input, 1.0 / 60.0);
            }

            let positions: Vec<_> = sim
                .scene()
                .entities()
                .iter()
                .filter(|e| e.has(Kind::Transform))
                .map(|e| e.position())
                .collect();
            (sim.score(), sim.is_defeated(), positions)
        };

        assert_eq!(run(usize::MAX), run(1));
    }
}
