//! Benchmark support for the volley engine.
//!
//! - **Scenarios**: seeded workloads that drive full ticks or collision passes
//! - **Tick timing**: per-tick durations and a tally of dispatch modes
//!
//! ```bash
//! cargo bench -p volley_bench
//! cargo bench -p volley_bench -- dispatch/movement
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports.

pub mod scenarios;
pub mod tick_timer;
