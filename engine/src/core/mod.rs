pub mod log;
pub mod logic;
pub mod sim_loop;
pub mod tasks;
pub mod time;

pub use logic::Logic;
pub use sim_loop::{RunSummary, SimLoop, StopReason};
pub use time::Time;
