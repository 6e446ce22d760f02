//! Shiftplan - model compiler and solution extractor
//!
//! Turns a declarative scheduling request (variables, constraints, optional
//! objective, soft constraints with penalties) into an engine model, runs
//! the engine, and decodes its verdict into a typed response:
//! - `bounds`: static ranges and interval arithmetic over expressions
//! - `compile`: materialization, constraint handlers, objective assembly
//! - `solve`: engine invocation, status mapping, violation reconstruction
//!
//! `solve_request` is the only entry point the service needs.

pub mod bounds;
pub mod compile;
pub mod solve;

#[cfg(test)]
mod tests;

pub use compile::{compile, CompiledModel, TrackedSoftConstraint};
pub use solve::solve_request;
