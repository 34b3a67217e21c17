use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use crossbeam::sync::WaitGroup;
use log::error;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads fed from a shared queue.
///
/// Work is submitted through a [`Scope`] and executed by the workers in FIFO order, but
/// completion order is non-deterministic. A task that panics is caught on the worker: the worker
/// keeps running and the panic is reported through the task's [`TaskFuture`] (or logged, for
/// tasks spawned without a result).
///
/// The pool is shut down once, when it is dropped: every worker receives a shutdown message after
/// the tasks already queued and is then joined.
pub struct Executor {
    name: String,
    sender: Sender<Message>,
    workers: Vec<Worker>,
}

enum Message {
    Task(Task),
    Shutdown,
}

struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Executor {
    /// Creates a new executor with the specified number of worker threads. The name is used for
    /// worker thread names and log messages.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        assert!(size > 0, "Thread pool size must be greater than 0");

        let name = name.into();
        let (sender, receiver) = unbounded();
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            workers.push(Worker::new(&name, id, receiver.clone()));
        }

        Executor {
            name,
            sender,
            workers,
        }
    }

    /// Creates a scope for spawning tasks that can access non-'static data.
    /// The scope ensures all spawned tasks complete before returning.
    ///
    /// # Example
    /// ```ignore
    /// let mut data = vec![1, 2, 3, 4];
    /// executor.scope(|s| {
    ///     for item in &mut data {
    ///         s.spawn(|| {
    ///             *item *= 2;
    ///         });
    ///     }
    /// });
    /// // All tasks guaranteed to be complete here
    /// assert_eq!(data, vec![2, 4, 6, 8]);
    /// ```
    pub fn scope<'env, F, R>(&'env self, f: F) -> R
    where
        F: FnOnce(&Scope<'env>) -> R,
    {
        let scope = Scope {
            executor: self,
            wait_group: Some(WaitGroup::new()),
            _phantom: PhantomData,
        };

        f(&scope)
    }

    fn submit(&self, task: Task) {
        if self.sender.send(Message::Task(task)).is_err() {
            // Only possible once every worker has exited.
            error!("executor `{}` has no workers left, dropping task", self.name);
        }
    }
}

/// A scope for spawning tasks that can borrow non-'static data.
/// All tasks spawned within the scope are guaranteed to complete before the scope ends, including
/// tasks that panic.
pub struct Scope<'env> {
    executor: &'env Executor,
    wait_group: Option<WaitGroup>,
    _phantom: PhantomData<std::cell::Cell<&'env ()>>,
}

impl<'env> Scope<'env> {
    /// Spawns a scoped task that can access data from the environment.
    /// The task must complete before the scope ends.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'env,
    {
        let guard = self.wait_group.clone();
        let task: Box<dyn FnOnce() + Send + 'env> = Box::new(move || {
            // The guard is dropped when the task returns or unwinds.
            let _guard = guard;
            f();
        });
        self.executor.submit(erase(task));
    }

    /// Spawns a scoped task and returns a future for its result.
    pub fn spawn_with_result<F, T>(&self, f: F) -> TaskFuture<T>
    where
        F: FnOnce() -> T + Send + 'env,
        T: Send + 'static,
    {
        let guard = self.wait_group.clone();
        let (task, future) = with_result(move || {
            let _guard = guard;
            f()
        });
        self.executor.submit(erase(task));
        future
    }
}

impl<'env> Drop for Scope<'env> {
    fn drop(&mut self) {
        // Every spawned task holds a clone of the wait group until it finishes.
        if let Some(wait_group) = self.wait_group.take() {
            wait_group.wait();
        }
    }
}

/// Erase the lifetime of a scoped task so it can travel through the executor's queue.
fn erase<'env>(task: Box<dyn FnOnce() + Send + 'env>) -> Task {
    // Safety: the task is only ever submitted from a `Scope<'env>`, whose drop blocks until the
    // task's wait group guard is released. The guard lives inside the task, so the task has
    // finished (or unwound) before anything it borrows for 'env can go away.
    unsafe { std::mem::transmute::<Box<dyn FnOnce() + Send + 'env>, Task>(task) }
}

/// Wrap a closure so its result (or panic) is sent to a [`TaskFuture`].
fn with_result<'env, F, T>(f: F) -> (Box<dyn FnOnce() + Send + 'env>, TaskFuture<T>)
where
    F: FnOnce() -> T + Send + 'env,
    T: Send + 'static,
{
    let (tx, rx) = bounded(1);
    let task = Box::new(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f))
            .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())));
        let _ = tx.send(result);
    });
    (task, TaskFuture { receiver: rx })
}

impl Drop for Executor {
    fn drop(&mut self) {
        // Send shutdown message to all workers
        for _ in &self.workers {
            let _ = self.sender.send(Message::Shutdown);
        }

        // Wait for all workers to finish
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("executor `{}` worker {} exited abnormally", self.name, worker.id);
                }
            }
        }
    }
}

impl Worker {
    fn new(pool: &str, id: usize, receiver: Receiver<Message>) -> Self {
        let thread_name = format!("{pool}-{id}");
        let pool = pool.to_string();
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                loop {
                    match receiver.recv() {
                        Ok(Message::Task(task)) => {
                            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                                error!(
                                    "executor `{pool}` worker {id} task panicked: {}",
                                    panic_message(payload.as_ref())
                                );
                            }
                        }
                        Ok(Message::Shutdown) => {
                            break;
                        }
                        Err(_) => {
                            // Channel disconnected, exit
                            break;
                        }
                    }
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("failed to spawn worker {id}: {e}");
                None
            }
        };

        Worker { id, handle }
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A future representing the result of a spawned task.
/// Use `wait()` to block until the task completes and get its result.
pub struct TaskFuture<T> {
    receiver: Receiver<Result<T, TaskError>>,
}

impl<T> TaskFuture<T> {
    /// Waits for the task to complete and returns its result.
    /// This blocks the current thread until the task finishes execution.
    pub fn wait(self) -> Result<T, TaskError> {
        self.receiver.recv().unwrap_or(Err(TaskError::Disconnected))
    }
}

/// Error type for task execution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task panicked. Carries the panic message.
    Panicked(String),
    /// The task was dropped without running (the executor went away).
    Disconnected,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskError::Panicked(message) => write!(f, "task panicked: {message}"),
            TaskError::Disconnected => write!(f, "task was dropped before completing"),
        }
    }
}

impl std::error::Error for TaskError {}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn test_scope_runs_every_task() {
        let executor = Executor::new("test", 4);
        let counter = AtomicUsize::new(0);

        executor.scope(|s| {
            for _ in 0..10 {
                let counter = &counter;
                s.spawn(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_executor_graceful_shutdown() {
        let executor = Executor::new("test", 2);
        let started = Arc::new(Mutex::new(false));

        executor.scope(|s| {
            let started = Arc::clone(&started);
            s.spawn(move || {
                thread::sleep(Duration::from_millis(50));
                *started.lock().unwrap() = true;
            });
        });

        // Dropping sends shutdown to idle workers and joins them
        drop(executor);
        assert!(*started.lock().unwrap());
    }

    #[test]
    fn test_scope_with_borrowed_data() {
        let executor = Executor::new("test", 4);
        let mut data = vec![1, 2, 3, 4, 5];

        executor.scope(|s| {
            for item in &mut data {
                s.spawn(move || {
                    *item *= 2;
                });
            }
        });

        // All tasks guaranteed to complete
        assert_eq!(data, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_scope_with_result() {
        let executor = Executor::new("test", 2);
        let base = 10;

        let result = executor.scope(|s| {
            let futures: Vec<_> = (0..5)
                .map(|i| s.spawn_with_result(move || base + i))
                .collect();

            futures.into_iter().map(|f| f.wait().unwrap()).sum::<i32>()
        });

        assert_eq!(result, 60); // 10+11+12+13+14 = 60
    }

    #[test]
    fn test_scope_ensures_completion() {
        let executor = Executor::new("test", 1);
        let completed = Arc::new(Mutex::new(vec![]));

        executor.scope(|s| {
            for i in 0..5 {
                let completed = Arc::clone(&completed);
                s.spawn(move || {
                    thread::sleep(Duration::from_millis(10));
                    completed.lock().unwrap().push(i);
                });
            }
        });

        // All tasks must have completed
        assert_eq!(completed.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_panicking_task_is_reported() {
        let executor = Executor::new("test", 2);

        let result = executor.scope(|s| {
            s.spawn_with_result(|| -> u32 { panic!("batch exploded") })
                .wait()
        });
        assert_eq!(result, Err(TaskError::Panicked("batch exploded".to_string())));

        // The pool keeps working after a panic
        assert_eq!(executor.scope(|s| s.spawn_with_result(|| 7).wait()), Ok(7));
    }

    #[test]
    fn test_panic_without_result_does_not_kill_worker() {
        let executor = Executor::new("test", 1);
        executor.scope(|s| s.spawn(|| panic!("ignored")));

        let result = executor.scope(|s| s.spawn_with_result(|| "still alive").wait());
        assert_eq!(result, Ok("still alive"));
    }

    #[test]
    fn test_scope_waits_for_siblings_of_a_panicking_task() {
        let executor = Executor::new("test", 2);
        let finished = AtomicUsize::new(0);

        let futures = executor.scope(|s| {
            let finished = &finished;
            (0..4)
                .map(|i| {
                    s.spawn_with_result(move || {
                        if i == 1 {
                            panic!("task {i} failed");
                        }
                        thread::sleep(Duration::from_millis(20));
                        finished.fetch_add(1, Ordering::SeqCst);
                        i
                    })
                })
                .collect::<Vec<_>>()
        });

        // The scope has joined: every surviving task is done already
        assert_eq!(finished.load(Ordering::SeqCst), 3);

        let results: Vec<_> = futures.into_iter().map(TaskFuture::wait).collect();
        assert_eq!(results[0], Ok(0));
        assert_eq!(results[1], Err(TaskError::Panicked("task 1 failed".to_string())));
        assert_eq!(results[3], Ok(3));
    }
}
