mod executor;

pub use executor::{Executor, Scope, TaskError, TaskFuture, panic_message};
