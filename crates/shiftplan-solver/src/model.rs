//! Model builder: variables, intervals, constraints, objective.

use std::time::Duration;

use thiserror::Error;

/// Handle to a scalar (boolean or integer) variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) usize);

/// Handle to an interval variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalId(pub(crate) usize);

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Le,
    Ge,
    Eq,
}

/// A linear expression `Σ coeff · var` over scalar variables.
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        LinearExpr::default()
    }

    /// A single-term expression.
    pub fn term(var: VarId, coeff: i64) -> Self {
        LinearExpr {
            terms: vec![(var, coeff)],
        }
    }

    pub fn add_term(&mut self, var: VarId, coeff: i64) {
        self.terms.push((var, coeff));
    }

    pub fn add_expr(&mut self, other: &LinearExpr) {
        self.terms.extend_from_slice(&other.terms);
    }

    /// The same expression with every coefficient negated.
    pub fn negated(&self) -> Self {
        LinearExpr {
            terms: self.terms.iter().map(|&(v, c)| (v, -c)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub(crate) struct VarDef {
    pub(crate) name: String,
    pub(crate) lower: i64,
    pub(crate) upper: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct IntervalDef {
    pub(crate) name: String,
    pub(crate) start: i64,
    pub(crate) end: i64,
    pub(crate) size: i64,
    pub(crate) presence: Option<VarId>,
}

#[derive(Debug, Clone)]
pub(crate) enum NativeConstraint {
    Linear {
        expr: LinearExpr,
        op: CmpOp,
        rhs: i64,
    },
    ExactlyOne(Vec<VarId>),
    AtMostOne(Vec<VarId>),
    Implication {
        premise: VarId,
        conclusion: VarId,
    },
    BoolOr(Vec<VarId>),
    BoolAnd(Vec<VarId>),
    NoOverlap(Vec<IntervalId>),
}

/// Structural problems that make a model unsolvable as posed.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("variable {name} has empty domain: [{lower}, {upper}]")]
    EmptyDomain { name: String, lower: i64, upper: i64 },

    #[error("interval {name} span {span} does not match size {size}")]
    BadIntervalSpan { name: String, span: i64, size: i64 },
}

/// A constraint model under construction.
///
/// Handles returned by the `new_*` methods stay valid for the lifetime of
/// the model; constraints and the objective refer to variables only through
/// them. Structural problems (empty domains, inconsistent interval spans)
/// are not errors at build time; they surface as an `Invalid` verdict when
/// the model is solved, so a caller assembling a model from untrusted input
/// gets a single failure path.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) vars: Vec<VarDef>,
    pub(crate) intervals: Vec<IntervalDef>,
    pub(crate) constraints: Vec<NativeConstraint>,
    pub(crate) objective: Option<(Sense, LinearExpr)>,
}

impl Model {
    pub fn new() -> Self {
        Model::default()
    }

    /// Creates a 0/1 decision variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> VarId {
        self.new_int_var(0, 1, name)
    }

    /// Creates a bounded integer decision variable.
    pub fn new_int_var(&mut self, lower: i64, upper: i64, name: impl Into<String>) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            lower,
            upper,
        });
        id
    }

    /// Creates a fixed interval spanning `[start, end)` of length `size`.
    pub fn new_fixed_interval(
        &mut self,
        start: i64,
        end: i64,
        size: i64,
        name: impl Into<String>,
    ) -> IntervalId {
        self.push_interval(start, end, size, None, name)
    }

    /// Creates a fixed interval that participates in interval constraints
    /// only while `presence` is true.
    pub fn new_optional_fixed_interval(
        &mut self,
        start: i64,
        end: i64,
        size: i64,
        presence: VarId,
        name: impl Into<String>,
    ) -> IntervalId {
        self.push_interval(start, end, size, Some(presence), name)
    }

    fn push_interval(
        &mut self,
        start: i64,
        end: i64,
        size: i64,
        presence: Option<VarId>,
        name: impl Into<String>,
    ) -> IntervalId {
        let id = IntervalId(self.intervals.len());
        self.intervals.push(IntervalDef {
            name: name.into(),
            start,
            end,
            size,
            presence,
        });
        id
    }

    /// Asserts `expr <op> rhs`.
    pub fn add_linear(&mut self, expr: LinearExpr, op: CmpOp, rhs: i64) {
        self.constraints
            .push(NativeConstraint::Linear { expr, op, rhs });
    }

    /// Asserts that exactly one of the literals is true.
    pub fn add_exactly_one(&mut self, literals: Vec<VarId>) {
        self.constraints.push(NativeConstraint::ExactlyOne(literals));
    }

    /// Asserts that at most one of the literals is true.
    pub fn add_at_most_one(&mut self, literals: Vec<VarId>) {
        self.constraints.push(NativeConstraint::AtMostOne(literals));
    }

    /// Asserts `premise ⇒ conclusion`.
    pub fn add_implication(&mut self, premise: VarId, conclusion: VarId) {
        self.constraints.push(NativeConstraint::Implication {
            premise,
            conclusion,
        });
    }

    /// Asserts that at least one of the literals is true.
    pub fn add_bool_or(&mut self, literals: Vec<VarId>) {
        self.constraints.push(NativeConstraint::BoolOr(literals));
    }

    /// Asserts that every literal is true.
    pub fn add_bool_and(&mut self, literals: Vec<VarId>) {
        self.constraints.push(NativeConstraint::BoolAnd(literals));
    }

    /// Asserts pairwise non-overlap over the given intervals; optional
    /// intervals count only while their presence literal is true.
    pub fn add_no_overlap(&mut self, intervals: Vec<IntervalId>) {
        self.constraints.push(NativeConstraint::NoOverlap(intervals));
    }

    /// Sets the objective to minimize `expr`. Replaces any previous
    /// objective; a model carries at most one optimization direction.
    pub fn minimize(&mut self, expr: LinearExpr) {
        self.objective = Some((Sense::Minimize, expr));
    }

    /// Sets the objective to maximize `expr`. Replaces any previous
    /// objective.
    pub fn maximize(&mut self, expr: LinearExpr) {
        self.objective = Some((Sense::Maximize, expr));
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        for var in &self.vars {
            if var.lower > var.upper {
                return Err(ModelError::EmptyDomain {
                    name: var.name.clone(),
                    lower: var.lower,
                    upper: var.upper,
                });
            }
        }
        for interval in &self.intervals {
            let span = interval.end - interval.start;
            if span != interval.size {
                return Err(ModelError::BadIntervalSpan {
                    name: interval.name.clone(),
                    span,
                    size: interval.size,
                });
            }
        }
        Ok(())
    }
}

/// Parameters for one solve call.
#[derive(Debug, Clone)]
pub struct SolveParams {
    /// Wall-clock budget for the search. Exceeding it is not an error: the
    /// result degrades to `Feasible` (incumbent found) or `Unknown`.
    pub time_limit: Duration,
    /// Stop at the first feasible solution instead of proving optimality.
    pub stop_after_first: bool,
}

impl Default for SolveParams {
    fn default() -> Self {
        SolveParams {
            time_limit: Duration::from_secs(60),
            stop_after_first: false,
        }
    }
}
