//! A small entity/component simulation with adaptive parallel dispatch.
//!
//! Entities own a closed set of components ([`ecs::component`]) and live in a [`ecs::Scene`].
//! High-cardinality groups run through the [`ecs::Dispatcher`], which switches between running on
//! the tick thread and fanning out to a worker pool depending on group size. [`game::Simulation`]
//! drives all of it as an arena shooter, and [`core::SimLoop`] drives the simulation against a
//! [`render::Renderer`] and an [`input::InputSource`].

pub mod config;
pub mod core;
pub mod ecs;
pub mod game;
pub mod input;
pub mod math;
pub mod render;
