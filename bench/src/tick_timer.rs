//! Per-tick timing for simulation runs, with a tally of how each tick's groups were dispatched.

use std::time::{Duration, Instant};

use volley_engine::{
    ecs::dispatch::Mode,
    game::{Simulation, TickReport},
    input::InputState,
};

/// Summary of a set of tick durations.
#[derive(Debug, Clone, Default)]
pub struct TickStats {
    sorted: Vec<Duration>,
    total: Duration,
}

impl TickStats {
    pub fn from_durations(mut durations: Vec<Duration>) -> Self {
        durations.sort();
        Self {
            total: durations.iter().sum(),
            sorted: durations,
        }
    }

    pub fn count(&self) -> usize {
        self.sorted.len()
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.sorted.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total / n,
        }
    }

    pub fn min(&self) -> Duration {
        self.sorted.first().copied().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.sorted.last().copied().unwrap_or_default()
    }

    /// The duration at or below which `p` percent of ticks fall, `p` clamped to 100.
    pub fn percentile(&self, p: usize) -> Duration {
        let Some(last) = self.sorted.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        self.sorted[(self.sorted.len() * p.min(100) / 100).min(last)]
    }

    /// Ticks per second at the mean tick time.
    pub fn rate(&self) -> f64 {
        let mean = self.mean();
        if mean.is_zero() {
            0.0
        } else {
            1.0 / mean.as_secs_f64()
        }
    }
}

impl std::fmt::Display for TickStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        write!(
            f,
            "{} ticks, mean {:.3}ms ({:.0}/s), p99 {:.3}ms, max {:.3}ms",
            self.count(),
            ms(self.mean()),
            self.rate(),
            ms(self.percentile(99)),
            ms(self.max()),
        )
    }
}

/// How often each dispatch mode was chosen across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeTally {
    pub sequential: usize,
    pub parallel: usize,
}

impl ModeTally {
    pub fn record(&mut self, report: &TickReport) {
        for mode in [report.projectile_mode, report.pursuer_mode].into_iter().flatten() {
            match mode {
                Mode::Sequential => self.sequential += 1,
                Mode::Parallel => self.parallel += 1,
            }
        }
    }
}

/// Tick `simulation` `ticks` times with a fixed input and time each tick.
pub fn measure_ticks(
    simulation: &mut Simulation,
    input: &InputState,
    dt: f32,
    ticks: usize,
) -> (TickStats, ModeTally) {
    let mut durations = Vec::with_capacity(ticks);
    let mut tally = ModeTally::default();
    for _ in 0..ticks {
        let start = Instant::now();
        let report = simulation.tick(input, dt);
        durations.push(start.elapsed());
        tally.record(&report);
    }
    (TickStats::from_durations(durations), tally)
}
