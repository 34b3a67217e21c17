//! Adaptive parallel dispatch over entity groups.
//!
//! The [`Dispatcher`] runs a per-item function over a slice and collects the outputs in slice
//! order. Small slices run on the calling thread. Once a slice reaches
//! [`DispatchConfig::threshold`] it is [`partition`]ed into contiguous batches that run on one of
//! two fixed worker pools, and the caller blocks until every batch has finished. Either way the
//! caller gets the same [`Outcome`] for the same input.
//!
//! Work dispatched here may only write to the entity at its own index. Retiring an entity is done
//! with the atomic [`Entity::destroy`](crate::ecs::entity::Entity::destroy); the group buffer
//! itself is only mutated after the join, by [`Group::compact`].
//!
//! An item that panics does not take the tick down with it: the panic is caught around that item,
//! logged, and reported as a [`BatchError`]. Only the panicking item yields `None`; the rest of its
//! batch still runs and reports its results.

use std::{
    fmt,
    ops::Range,
    panic::{self, AssertUnwindSafe},
};

use log::{debug, error};

use crate::core::tasks::{Executor, TaskError, TaskFuture, panic_message};

mod batch;
pub mod collision;
mod group;

pub use batch::partition;
pub use group::Group;

/// Dispatcher tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Slices with at least this many items run in parallel.
    pub threshold: usize,
    /// Threads per pool, and the number of batches a parallel slice is split into.
    pub workers: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            workers: 4,
        }
    }
}

/// How a slice was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Parallel,
}

/// The pool a phase runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// Movement and targeting.
    Movement,
    /// Collision detection.
    Collision,
}

/// Work that failed inside a batch: a single item that panicked, or the whole batch if its task
/// never reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    /// The phase the batch belonged to.
    pub phase: &'static str,
    /// Index of the batch within the phase.
    pub batch: usize,
    /// The items the batch covered.
    pub range: Range<usize>,
    /// The item that panicked. `None` when the whole batch was lost.
    pub item: Option<usize>,
    pub message: String,
}

impl BatchError {
    /// The items whose results were lost.
    pub fn lost(&self) -> Range<usize> {
        match self.item {
            Some(item) => item..item + 1,
            None => self.range.clone(),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} batch {} (items {}..{}) failed",
            self.phase, self.batch, self.range.start, self.range.end
        )?;
        if let Some(item) = self.item {
            write!(f, " at item {item}")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for BatchError {}

/// Per-item results of a dispatched phase, in input order.
#[derive(Debug)]
pub struct Outcome<R> {
    pub mode: Mode,
    /// Number of batches the input was split into.
    pub batches: usize,
    /// One entry per input item. `None` for items that failed.
    pub results: Vec<Option<R>>,
    pub failures: Vec<BatchError>,
}

impl<R> Outcome<R> {
    fn empty(mode: Mode) -> Self {
        Self {
            mode,
            batches: 0,
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Whether every batch completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Results of the items that completed, with their input index.
    pub fn completed(&self) -> impl Iterator<Item = (usize, &R)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.as_ref().map(|r| (index, r)))
    }

    /// Record the per-item results of one batch.
    fn absorb(
        &mut self,
        phase: &'static str,
        batch: usize,
        range: Range<usize>,
        result: Result<Vec<Result<R, String>>, TaskError>,
    ) {
        let values = match result {
            Ok(values) => values,
            Err(e) => {
                let message = match e {
                    TaskError::Panicked(message) => message,
                    other => other.to_string(),
                };
                self.fail(phase, batch, range.clone(), None, message);
                self.results.extend(range.map(|_| None));
                return;
            }
        };
        for (item, value) in range.clone().zip(values) {
            match value {
                Ok(value) => self.results.push(Some(value)),
                Err(message) => {
                    self.fail(phase, batch, range.clone(), Some(item), message);
                    self.results.push(None);
                }
            }
        }
    }

    fn fail(
        &mut self,
        phase: &'static str,
        batch: usize,
        range: Range<usize>,
        item: Option<usize>,
        message: String,
    ) {
        let failure = BatchError {
            phase,
            batch,
            range,
            item,
            message,
        };
        error!("{failure}");
        self.failures.push(failure);
    }
}

/// Run `f` on one item, turning a panic into its message.
fn guarded<T, R>(f: &impl Fn(&T) -> R, item: &T) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(|| f(item)))
        .map_err(|payload| panic_message(payload.as_ref()))
}

/// Runs per-item work over entity groups, sequentially or across a worker pool depending on size.
pub struct Dispatcher {
    config: DispatchConfig,
    movement: Executor,
    collision: Executor,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        let workers = config.workers.max(1);
        debug!(
            "starting dispatcher: {workers} workers per pool, parallel from {} items",
            config.threshold
        );
        Self {
            config: DispatchConfig { workers, ..config },
            movement: Executor::new("movement", workers),
            collision: Executor::new("collision", workers),
        }
    }

    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// The mode a slice of `len` items would run in.
    pub fn mode_for(&self, len: usize) -> Mode {
        if len < self.config.threshold {
            Mode::Sequential
        } else {
            Mode::Parallel
        }
    }

    /// Run `f` over every item and collect the outputs in item order. Blocks until all work is
    /// done.
    pub fn run<T, R, F>(&self, pool: Pool, phase: &'static str, items: &[T], f: F) -> Outcome<R>
    where
        T: Sync,
        R: Send + 'static,
        F: Fn(&T) -> R + Sync,
    {
        let mode = self.mode_for(items.len());
        if items.is_empty() {
            return Outcome::empty(mode);
        }
        match mode {
            Mode::Sequential => self.run_sequential(phase, items, f),
            Mode::Parallel => self.run_parallel(pool, phase, items, f),
        }
    }

    fn run_sequential<T, R, F>(&self, phase: &'static str, items: &[T], f: F) -> Outcome<R>
    where
        F: Fn(&T) -> R,
    {
        let mut outcome = Outcome::empty(Mode::Sequential);
        outcome.batches = 1;
        let values = items.iter().map(|item| guarded(&f, item)).collect();
        outcome.absorb(phase, 0, 0..items.len(), Ok(values));
        outcome
    }

    fn run_parallel<T, R, F>(&self, pool: Pool, phase: &'static str, items: &[T], f: F) -> Outcome<R>
    where
        T: Sync,
        R: Send + 'static,
        F: Fn(&T) -> R + Sync,
    {
        let ranges = partition(items.len(), self.config.workers);
        let f = &f;

        let results: Vec<Result<Vec<Result<R, String>>, TaskError>> =
            self.executor(pool).scope(|scope| {
                let futures: Vec<TaskFuture<Vec<Result<R, String>>>> = ranges
                    .iter()
                    .map(|range| {
                        let batch = &items[range.clone()];
                        scope.spawn_with_result(move || {
                            batch.iter().map(|item| guarded(f, item)).collect()
                        })
                    })
                    .collect();
                futures.into_iter().map(TaskFuture::wait).collect()
            });

        let mut outcome = Outcome::empty(Mode::Parallel);
        outcome.batches = ranges.len();
        for (batch, (range, result)) in ranges.into_iter().zip(results).enumerate() {
            outcome.absorb(phase, batch, range, result);
        }
        outcome
    }

    fn executor(&self, pool: Pool) -> &Executor {
        match pool {
            Pool::Movement => &self.movement,
            Pool::Collision => &self.collision,
        }
    }

    /// Stop both pools, joining their workers.
    pub fn shutdown(self) {
        debug!("shutting down dispatcher");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecs::{
            component::{Physics, Transform},
            entity::{self, Entity, Role},
        },
        math::Vector,
    };

    fn dispatcher(threshold: usize) -> Dispatcher {
        Dispatcher::new(DispatchConfig {
            threshold,
            workers: 4,
        })
    }

    fn swarm(n: usize) -> Vec<entity::Ref> {
        (0..n)
            .map(|i| {
                Entity::new(format!("p{i}"), Role::Pursuer)
                    .with(Transform::at(Vector::new(i as f32 * 10.0, 50.0)))
                    .with(Physics::new(0.5).with_friction(0.98))
                    .into_ref()
            })
            .collect()
    }

    fn steer(entity: &entity::Ref) -> Vector {
        let target = Vector::new(400.0, 300.0);
        let position = entity.position().unwrap_or(Vector::ZERO);
        let velocity = (target - position).normalize() * 80.0;
        entity.write::<Physics, _>(|p| p.set_velocity(velocity));
        entity.update(0.1);
        entity.position().unwrap_or(Vector::ZERO)
    }

    #[test]
    fn test_mode_follows_threshold() {
        let dispatcher = dispatcher(10);
        assert_eq!(dispatcher.mode_for(9), Mode::Sequential);
        assert_eq!(dispatcher.mode_for(10), Mode::Parallel);
    }

    #[test]
    fn test_sequential_and_parallel_paths_agree() {
        // Given the same group processed below and at the threshold
        let n = 9;
        let sequential = dispatcher(10).run(Pool::Movement, "steer", &swarm(n), steer);
        let parallel = dispatcher(1).run(Pool::Movement, "steer", &swarm(n), steer);

        // Then both paths produce identical per-item results
        assert_eq!(sequential.mode, Mode::Sequential);
        assert_eq!(parallel.mode, Mode::Parallel);
        assert_eq!(parallel.batches, 3);
        assert_eq!(sequential.results, parallel.results);
        assert!(sequential.is_complete() && parallel.is_complete());
    }

    #[test]
    fn test_results_are_in_input_order() {
        let items: Vec<usize> = (0..103).collect();
        let outcome = dispatcher(10).run(Pool::Collision, "square", &items, |i| i * i);

        assert_eq!(outcome.batches, 4);
        let expected: Vec<_> = items.iter().map(|i| Some(i * i)).collect();
        assert_eq!(outcome.results, expected);
    }

    #[test]
    fn test_panicking_item_yields_none_for_itself_only() {
        // Given 12 items split into batches of 3, one item of which panics
        let items: Vec<usize> = (0..12).collect();
        let outcome = dispatcher(10).run(Pool::Movement, "flaky", &items, |&i| {
            if i == 7 {
                panic!("item {i} exploded");
            }
            i
        });

        // Then only item 7 is lost, its batch siblings still report
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.batch, 2);
        assert_eq!(failure.range, 6..9);
        assert_eq!(failure.item, Some(7));
        assert_eq!(failure.lost(), 7..8);
        assert_eq!(failure.message, "item 7 exploded");
        assert_eq!(
            failure.to_string(),
            "flaky batch 2 (items 6..9) failed at item 7: item 7 exploded"
        );

        for (index, result) in outcome.results.iter().enumerate() {
            if index == 7 {
                assert_eq!(*result, None);
            } else {
                assert_eq!(*result, Some(index));
            }
        }
        assert_eq!(outcome.completed().count(), 11);
    }

    #[test]
    fn test_panicking_sequential_item_is_caught() {
        let items = [1, 2, 3];
        let outcome = dispatcher(10).run(Pool::Movement, "small", &items, |&i| {
            if i == 2 {
                panic!("bad item");
            }
            i
        });

        assert_eq!(outcome.mode, Mode::Sequential);
        assert_eq!(outcome.results, vec![Some(1), None, Some(3)]);
        assert_eq!(outcome.failures[0].range, 0..3);
        assert_eq!(outcome.failures[0].item, Some(1));
    }

    #[test]
    fn test_retirements_before_a_panic_are_still_reported() {
        // Given 12 entities in parallel batches of 3, where retiring item 8 panics
        let group = swarm(12);
        let outcome = dispatcher(10).run(Pool::Movement, "retire", &group, |entity| {
            let index = entity.position().map(|p| p.x / 10.0).unwrap_or(0.0) as usize;
            if index == 8 {
                panic!("item {index} exploded");
            }
            entity.destroy()
        });

        // Then every entity that was retired is reported as retired
        let retired = group.iter().filter(|e| !e.is_active()).count();
        let reported = outcome.completed().filter(|(_, r)| **r).count();
        assert_eq!(retired, 11);
        assert_eq!(reported, retired);
        assert_eq!(outcome.results[6], Some(true));
        assert_eq!(outcome.results[7], Some(true));
        assert_eq!(outcome.results[8], None);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn test_entity_writes_from_workers_are_visible_after_join() {
        let group = swarm(40);
        let outcome = dispatcher(10).run(Pool::Movement, "retire", &group, |entity| {
            let index = entity.position().map(|p| p.x / 10.0).unwrap_or(0.0) as usize;
            index % 2 == 0 && entity.destroy()
        });

        assert!(outcome.is_complete());
        let retired = group.iter().filter(|e| !e.is_active()).count();
        assert_eq!(retired, 20);
        assert_eq!(outcome.completed().filter(|(_, r)| **r).count(), 20);
    }

    #[test]
    fn test_empty_input() {
        let items: [u8; 0] = [];
        let outcome = dispatcher(10).run(Pool::Collision, "none", &items, |&i| i);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.batches, 0);
    }
}
