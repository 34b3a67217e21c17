//! Front end for the volley simulation: a crossterm terminal renderer and input source, a scripted
//! autopilot for unattended runs, and command line options.

pub mod autopilot;
pub mod options;
pub mod terminal;

pub use autopilot::Autopilot;
pub use options::{Options, OptionsError, USAGE};
