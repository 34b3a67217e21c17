//! Workloads for the dispatcher benchmarks.
//!
//! - **Swarm**: full simulation ticks with large, topped up projectile and pursuer groups
//! - **Crossfire**: collision resolution alone over two seeded groups

pub mod crossfire;
pub mod swarm;

pub use crossfire::{CrossfireConfig, CrossfireScenario};
pub use swarm::{SwarmConfig, SwarmScenario};

/// Common shape of a benchmark workload.
pub trait Scenario {
    fn name(&self) -> &'static str;

    /// Entities the scenario keeps alive per update.
    fn entity_count(&self) -> usize;

    /// Spawn the initial population.
    fn setup(&mut self);

    /// Run one step.
    fn update(&mut self);

    fn teardown(&mut self);
}
