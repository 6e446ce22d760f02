//! Shiftplan Solver - a small CP engine
//!
//! Typed 0/1 and bounded-integer variables, fixed (optionally present)
//! intervals, linear and logical constraints, and at most one optimization
//! direction, solved by bounded-time branch-and-bound search:
//! - `Model` builds the problem and hands out stable variable handles
//! - `solve` runs the search under a wall-clock budget
//! - `SolveResult` carries the verdict, assignment, statistics, diagnostic
//!
//! The engine is deliberately opaque to its callers: the contract is the
//! model builder on the way in and the status/assignment/statistics on the
//! way out, nothing about the search itself.

pub mod model;
pub mod search;


pub use model::{
    CmpOp, IntervalId, LinearExpr, Model, ModelError, Sense, SolveParams, VarId,
};
pub use search::{solve, Assignment, SolveResult, SolveStats, SolveStatus};
