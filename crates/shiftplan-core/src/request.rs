//! Request-side wire types.
//!
//! The JSON schema is strict: every struct rejects unknown fields, so a
//! misspelled or extraneous key fails at the transport instead of being
//! silently ignored. `Variable` and `Constraint` are flat tag-plus-fields
//! records (the tag itself is a Rust enum, so dispatch over kinds stays
//! exhaustive); which optional fields a given kind requires is validated
//! during compilation, not during deserialization.

use std::fmt;

use serde::Deserialize;

use crate::error::{CompileError, Result};

/// Declared class of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Bool,
    Int,
    Interval,
}

/// A decision variable declaration.
///
/// - `bool`: 0/1 decision variable.
/// - `int`: bounded integer, `min` and `max` required.
/// - `interval`: fixed interval with absolute `start`/`end` and exact
///   `size`; with `presenceVar` set it is optional and counts as active in
///   interval constraints only while that boolean is true. Interval names
///   never appear in linear expressions.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variable {
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub name: String,

    // int
    pub min: Option<i64>,
    pub max: Option<i64>,

    // interval
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub size: Option<i64>,
    #[serde(rename = "presenceVar")]
    pub presence_var: Option<String>,
}

/// One linear term `var * coeff`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Term {
    pub var: String,
    pub coeff: i64,
}

/// Comparison operator of a (soft) linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Le => write!(f, "<="),
            Comparator::Ge => write!(f, ">="),
            Comparator::Eq => write!(f, "=="),
        }
    }
}

/// Constraint kind tag. One handler per kind in the compiler; the match is
/// exhaustive, so adding a kind without a handler fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Linear,
    SoftLinear,
    ExactlyOne,
    AtMostOne,
    Implication,
    BoolOr,
    BoolAnd,
    NoOverlap,
}

impl ConstraintKind {
    /// The wire token, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Linear => "linear",
            ConstraintKind::SoftLinear => "soft_linear",
            ConstraintKind::ExactlyOne => "exactly_one",
            ConstraintKind::AtMostOne => "at_most_one",
            ConstraintKind::Implication => "implication",
            ConstraintKind::BoolOr => "bool_or",
            ConstraintKind::BoolAnd => "bool_and",
            ConstraintKind::NoOverlap => "no_overlap",
        }
    }
}

/// A constraint over declared variables.
///
/// Only the fields relevant to `kind` may be present; a field belonging to
/// a different kind is a configuration error.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,

    // linear / soft_linear
    pub terms: Option<Vec<Term>>,
    pub op: Option<Comparator>,
    pub rhs: Option<i64>,

    // soft_linear
    pub penalty: Option<i64>,
    pub id: Option<String>,

    // exactly_one / at_most_one / bool_or / bool_and
    pub vars: Option<Vec<String>>,

    // implication
    #[serde(rename = "if")]
    pub if_var: Option<String>,
    pub then: Option<String>,

    // no_overlap
    pub intervals: Option<Vec<String>>,
}

impl Constraint {
    /// Rejects fields that belong to a different constraint kind.
    pub fn reject_foreign_fields(&self) -> Result<()> {
        let kind = self.kind.name();
        let present: [(&'static str, bool); 8] = [
            ("terms", self.terms.is_some()),
            ("op", self.op.is_some()),
            ("rhs", self.rhs.is_some()),
            ("penalty", self.penalty.is_some()),
            ("id", self.id.is_some()),
            ("vars", self.vars.is_some()),
            ("if", self.if_var.is_some()),
            ("then", self.then.is_some()),
        ];
        let allowed: &[&str] = match self.kind {
            ConstraintKind::Linear => &["terms", "op", "rhs"],
            ConstraintKind::SoftLinear => &["terms", "op", "rhs", "penalty", "id"],
            ConstraintKind::ExactlyOne
            | ConstraintKind::AtMostOne
            | ConstraintKind::BoolOr
            | ConstraintKind::BoolAnd => &["vars"],
            ConstraintKind::Implication => &["if", "then"],
            ConstraintKind::NoOverlap => &[],
        };
        for (field, is_present) in present {
            if is_present && !allowed.contains(&field) {
                return Err(CompileError::foreign_field(kind, field));
            }
        }
        if self.intervals.is_some() && self.kind != ConstraintKind::NoOverlap {
            return Err(CompileError::foreign_field(kind, "intervals"));
        }
        Ok(())
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Optional objective definition. At most one per request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Objective {
    pub sense: ObjectiveSense,
    pub terms: Vec<Term>,
}

fn default_time_limit() -> f64 {
    60.0
}

/// Solver tuning options.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolveOptions {
    #[serde(rename = "timeLimitSeconds", default = "default_time_limit")]
    pub time_limit_seconds: f64,
    /// Only `solutionLimit = 1` has an effect: stop after the first feasible
    /// solution. Other values are accepted and ignored.
    #[serde(rename = "solutionLimit")]
    pub solution_limit: Option<i64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            time_limit_seconds: default_time_limit(),
            solution_limit: None,
        }
    }
}

/// Request payload accepted by the solver service.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolveRequest {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: Option<Objective>,
    pub options: Option<SolveOptions>,
}
