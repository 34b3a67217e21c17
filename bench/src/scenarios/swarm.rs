use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use volley_engine::{
    config::{Config, DispatchConfig, GameplayConfig},
    game::{Simulation, TickReport},
    input::InputState,
    math::Vector,
};

use super::Scenario;

const DT: f32 = 1.0 / 60.0;

/// Sizing for [`SwarmScenario`].
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    pub pursuers: usize,
    pub projectiles: usize,
    pub dispatch: DispatchConfig,
    pub seed: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            pursuers: 500,
            projectiles: 500,
            dispatch: DispatchConfig::default(),
            seed: 7,
        }
    }
}

/// Full simulation ticks. Both groups are topped up after every tick so the workload does not
/// drain away as projectiles leave the arena and pursuers are destroyed.
pub struct SwarmScenario {
    config: SwarmConfig,
    simulation: Option<Simulation>,
    rng: ChaCha8Rng,
    input: InputState,
    last: Option<TickReport>,
}

impl SwarmScenario {
    pub fn with_config(config: SwarmConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            simulation: None,
            input: InputState::new(),
            last: None,
        }
    }

    /// The report of the most recent tick.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.last.as_ref()
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    fn top_up(&mut self) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        let arena = simulation.config().arena;
        let speed = simulation.config().gameplay.projectile_speed;

        for _ in simulation.pursuers().len()..self.config.pursuers {
            let position = Vector::new(
                self.rng.gen_range(0.0..arena.width),
                self.rng.gen_range(0.0..arena.height),
            );
            simulation.spawn_pursuer(position, Vector::ZERO);
        }
        for _ in simulation.projectiles().len()..self.config.projectiles {
            let position = Vector::new(
                self.rng.gen_range(0.0..arena.width),
                self.rng.gen_range(0.0..arena.height),
            );
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            simulation.spawn_projectile(position, Vector::new(angle.cos(), angle.sin()) * speed);
        }
    }
}

impl Default for SwarmScenario {
    fn default() -> Self {
        Self::with_config(SwarmConfig::default())
    }
}

impl Scenario for SwarmScenario {
    fn name(&self) -> &'static str {
        "swarm"
    }

    fn entity_count(&self) -> usize {
        self.config.pursuers + self.config.projectiles
    }

    fn setup(&mut self) {
        let config = Config {
            dispatch: self.config.dispatch,
            gameplay: GameplayConfig {
                // The player never loses and the timer never spawns extra pursuers
                player_hit_radius: 0.0,
                spawn_interval: 0.0,
                initial_pursuers: 0,
                decorations: 0,
                ..Default::default()
            },
            seed: self.config.seed,
            ..Default::default()
        };
        let mut simulation = Simulation::new(config);
        simulation.initialize();
        self.simulation = Some(simulation);
        self.top_up();
    }

    fn update(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            self.last = Some(simulation.tick(&self.input, DT));
        }
        // Spawns join their groups on the next tick
        self.top_up();
    }

    fn teardown(&mut self) {
        if let Some(simulation) = self.simulation.take() {
            simulation.shutdown();
        }
        self.last = None;
    }
}
