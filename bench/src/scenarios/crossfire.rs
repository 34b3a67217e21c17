use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use volley_engine::{
    config::{ArenaConfig, DispatchConfig, GameplayConfig},
    ecs::dispatch::{Dispatcher, Group, collision},
    game::spawn,
    math::Vector,
};

use super::Scenario;

/// Sizing for [`CrossfireScenario`].
#[derive(Debug, Clone)]
pub struct CrossfireConfig {
    pub projectiles: usize,
    pub pursuers: usize,
    pub dispatch: DispatchConfig,
    pub seed: u64,
}

impl Default for CrossfireConfig {
    fn default() -> Self {
        Self {
            projectiles: 1_000,
            pursuers: 1_000,
            dispatch: DispatchConfig::default(),
            seed: 11,
        }
    }
}

/// One collision pass over two freshly populated groups. Every update consumes the groups, so
/// callers [`reload`](CrossfireScenario::reload) between passes.
pub struct CrossfireScenario {
    config: CrossfireConfig,
    gameplay: GameplayConfig,
    arena: ArenaConfig,
    dispatcher: Option<Dispatcher>,
    projectiles: Group,
    pursuers: Group,
    rng: ChaCha8Rng,
    hits: usize,
}

impl CrossfireScenario {
    pub fn with_config(config: CrossfireConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            gameplay: GameplayConfig::default(),
            arena: ArenaConfig::default(),
            dispatcher: None,
            projectiles: Group::new("projectiles"),
            pursuers: Group::new("pursuers"),
            hits: 0,
        }
    }

    /// Hits found by the last pass.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Replace both groups with new seeded populations.
    pub fn reload(&mut self) {
        self.projectiles.clear();
        self.pursuers.clear();
        for _ in 0..self.config.pursuers {
            let position = self.random_position();
            self.pursuers
                .push(spawn::pursuer(position, Vector::ZERO).into_ref());
        }
        for _ in 0..self.config.projectiles {
            let center = self.random_position();
            self.projectiles
                .push(spawn::projectile(&self.gameplay, center, Vector::UNIT_X).into_ref());
        }
    }

    fn random_position(&mut self) -> Vector {
        Vector::new(
            self.rng.gen_range(0.0..self.arena.width),
            self.rng.gen_range(0.0..self.arena.height),
        )
    }
}

impl Default for CrossfireScenario {
    fn default() -> Self {
        Self::with_config(CrossfireConfig::default())
    }
}

impl Scenario for CrossfireScenario {
    fn name(&self) -> &'static str {
        "crossfire"
    }

    fn entity_count(&self) -> usize {
        self.config.projectiles + self.config.pursuers
    }

    fn setup(&mut self) {
        self.dispatcher = Some(Dispatcher::new(self.config.dispatch));
        self.reload();
    }

    fn update(&mut self) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };
        let resolution = collision::resolve(
            dispatcher,
            &mut self.projectiles,
            &mut self.pursuers,
            self.gameplay.hit_radius,
        );
        self.hits = resolution.hits.len();
    }

    fn teardown(&mut self) {
        self.projectiles.clear();
        self.pursuers.clear();
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.shutdown();
        }
    }
}
