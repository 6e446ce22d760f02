//! Shiftplan Core - wire data model for the solver service
//!
//! This crate defines the JSON request/response types shared by the model
//! compiler and the HTTP service, plus the compilation error type:
//! - Request types for variables, constraints, objective, and options
//! - Response types for status, values, statistics, and soft violations
//! - `CompileError` for configuration errors caught before the engine runs

pub mod error;
pub mod request;
pub mod response;


pub use error::{CompileError, Result};
pub use request::{
    Comparator, Constraint, ConstraintKind, Objective, ObjectiveSense, SolveOptions, SolveRequest,
    Term, Variable, VariableKind,
};
pub use response::{ResponseStatus, SoftViolation, SolveResponse, Statistics};
