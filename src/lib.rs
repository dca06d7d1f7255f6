//! Rules engine for a two-board falling-pair matching duel.
//!
//! The library owns every rule: spawning, movement, gravity, group matching,
//! chain resolution, scoring and the nuisance exchange between the boards.
//! Rendering and input wiring live in the binary.

pub mod config;
pub mod game;
pub mod grid;
pub mod nuisance;
pub mod piece;
pub mod queue;
pub mod resolver;
pub mod scoring;
