//! Compilation of a request into an engine model.
//!
//! Runs in fixed stages: bounds, variable materialization, constraint
//! compilation, objective assembly. Every stage only reads state produced by
//! earlier stages; the name→handle maps are immutable once materialization
//! finishes.

use std::collections::HashMap;

use shiftplan_core::{
    Comparator, CompileError, Constraint, ConstraintKind, Objective, ObjectiveSense, Result,
    SolveRequest, Term, Variable, VariableKind,
};
use shiftplan_solver::{CmpOp, IntervalId, LinearExpr, Model, VarId};

use crate::bounds::{collect_bounds, expression_range, VariableBounds};

/// A soft constraint kept for post-solve diagnostics. Only soft constraints
/// with a caller-supplied id are tracked; the rest are penalized but never
/// individually reported.
#[derive(Debug, Clone)]
pub struct TrackedSoftConstraint {
    pub id: String,
    pub violation_var: VarId,
    pub target_value: i64,
    pub comparator: Comparator,
    pub terms: Vec<Term>,
}

/// Output of compilation, ready to hand to the engine.
#[derive(Debug)]
pub struct CompiledModel {
    pub model: Model,
    /// Declared scalar variables only; violation variables are internal and
    /// never read back into the response values.
    pub scalar_vars: HashMap<String, VarId>,
    /// Whether an optimization direction was sent (user objective and/or
    /// penalties). Decides whether objective statistics are read back.
    pub has_objective: bool,
    pub tracked_soft: Vec<TrackedSoftConstraint>,
}

#[derive(Debug, Clone, Copy)]
struct ScalarHandle {
    id: VarId,
    boolean: bool,
}

/// Narrows a worst-case violation back to the engine's value range. The
/// range arithmetic runs in `i128`, so an oversized expression surfaces as
/// a configuration error instead of wrapping.
fn violation_bound(worst: i128) -> Result<i64> {
    i64::try_from(worst).map_err(|_| CompileError::BoundOverflow {
        kind: "soft_linear",
        value: worst,
    })
}

/// Compiles a request into an engine model.
pub fn compile(request: &SolveRequest) -> Result<CompiledModel> {
    let mut compiler = ModelCompiler::new(&request.variables)?;
    compiler.materialize(&request.variables)?;
    for constraint in &request.constraints {
        compiler.add_constraint(constraint)?;
    }
    let has_objective = compiler.assemble_objective(request.objective.as_ref())?;
    Ok(compiler.finish(has_objective))
}

struct ModelCompiler {
    model: Model,
    bounds: HashMap<String, VariableBounds>,
    scalars: HashMap<String, ScalarHandle>,
    intervals: HashMap<String, IntervalId>,
    penalty_terms: LinearExpr,
    tracked_soft: Vec<TrackedSoftConstraint>,
    soft_ordinal: usize,
}

impl ModelCompiler {
    fn new(variables: &[Variable]) -> Result<Self> {
        Ok(ModelCompiler {
            model: Model::new(),
            bounds: collect_bounds(variables)?,
            scalars: HashMap::new(),
            intervals: HashMap::new(),
            penalty_terms: LinearExpr::new(),
            tracked_soft: Vec::new(),
            soft_ordinal: 0,
        })
    }

    /// Creates one engine handle per declared variable, in declaration
    /// order. A presence variable must be declared before the interval that
    /// references it.
    fn materialize(&mut self, variables: &[Variable]) -> Result<()> {
        for var in variables {
            match var.kind {
                VariableKind::Bool => {
                    let id = self.model.new_bool_var(&var.name);
                    self.scalars
                        .insert(var.name.clone(), ScalarHandle { id, boolean: true });
                }
                VariableKind::Int => {
                    // Presence and validity established by collect_bounds.
                    let var_bounds = self.bounds[&var.name];
                    let id = self
                        .model
                        .new_int_var(var_bounds.lower, var_bounds.upper, &var.name);
                    self.scalars
                        .insert(var.name.clone(), ScalarHandle { id, boolean: false });
                }
                VariableKind::Interval => self.materialize_interval(var)?,
            }
        }
        Ok(())
    }

    fn materialize_interval(&mut self, var: &Variable) -> Result<()> {
        let (Some(start), Some(end), Some(size)) = (var.start, var.end, var.size) else {
            return Err(CompileError::MissingBound {
                kind: "interval",
                name: var.name.clone(),
                fields: "start, end, and size",
            });
        };
        if end - start != size {
            return Err(CompileError::IntervalInconsistent {
                name: var.name.clone(),
                span: end - start,
                size,
            });
        }
        let id = match &var.presence_var {
            None => self.model.new_fixed_interval(start, end, size, &var.name),
            Some(presence) => {
                let literal = self.resolve_bool(presence)?;
                self.model
                    .new_optional_fixed_interval(start, end, size, literal, &var.name)
            }
        };
        self.intervals.insert(var.name.clone(), id);
        Ok(())
    }

    fn resolve_scalar(&self, name: &str) -> Result<VarId> {
        self.scalars
            .get(name)
            .map(|handle| handle.id)
            .ok_or_else(|| CompileError::UnknownVariable(name.to_string()))
    }

    /// Resolves a name that must be a materialized boolean. An integer or
    /// interval name is as unusable here as an undeclared one.
    fn resolve_bool(&self, name: &str) -> Result<VarId> {
        match self.scalars.get(name) {
            Some(handle) if handle.boolean => Ok(handle.id),
            _ => Err(CompileError::UnknownVariable(name.to_string())),
        }
    }

    fn resolve_bool_list(&self, kind: ConstraintKind, vars: &Option<Vec<String>>) -> Result<Vec<VarId>> {
        let names = match vars {
            Some(names) if !names.is_empty() => names,
            _ => return Err(CompileError::missing_field(kind.name(), "vars")),
        };
        names.iter().map(|name| self.resolve_bool(name)).collect()
    }

    fn linear_expr(&self, terms: &[Term]) -> Result<LinearExpr> {
        let mut expr = LinearExpr::new();
        for term in terms {
            expr.add_term(self.resolve_scalar(&term.var)?, term.coeff);
        }
        Ok(expr)
    }

    /// Dispatches one constraint to its handler. The match is exhaustive
    /// over the kind tag, so an unhandled kind cannot compile.
    fn add_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        constraint.reject_foreign_fields()?;
        match constraint.kind {
            ConstraintKind::Linear => self.add_linear(constraint),
            ConstraintKind::SoftLinear => self.add_soft_linear(constraint),
            ConstraintKind::ExactlyOne => {
                let literals = self.resolve_bool_list(constraint.kind, &constraint.vars)?;
                self.model.add_exactly_one(literals);
                Ok(())
            }
            ConstraintKind::AtMostOne => {
                let literals = self.resolve_bool_list(constraint.kind, &constraint.vars)?;
                self.model.add_at_most_one(literals);
                Ok(())
            }
            ConstraintKind::Implication => self.add_implication(constraint),
            ConstraintKind::BoolOr => {
                let literals = self.resolve_bool_list(constraint.kind, &constraint.vars)?;
                self.model.add_bool_or(literals);
                Ok(())
            }
            ConstraintKind::BoolAnd => {
                let literals = self.resolve_bool_list(constraint.kind, &constraint.vars)?;
                self.model.add_bool_and(literals);
                Ok(())
            }
            ConstraintKind::NoOverlap => self.add_no_overlap(constraint),
        }
    }

    fn require_linear_fields<'c>(
        &self,
        constraint: &'c Constraint,
    ) -> Result<(&'c [Term], Comparator, i64)> {
        let kind = constraint.kind.name();
        let terms = match &constraint.terms {
            Some(terms) if !terms.is_empty() => terms.as_slice(),
            _ => return Err(CompileError::missing_field(kind, "terms")),
        };
        let op = constraint
            .op
            .ok_or_else(|| CompileError::missing_field(kind, "op"))?;
        let rhs = constraint
            .rhs
            .ok_or_else(|| CompileError::missing_field(kind, "rhs"))?;
        Ok((terms, op, rhs))
    }

    fn add_linear(&mut self, constraint: &Constraint) -> Result<()> {
        let (terms, op, rhs) = self.require_linear_fields(constraint)?;
        let expr = self.linear_expr(terms)?;
        let cmp = match op {
            Comparator::Le => CmpOp::Le,
            Comparator::Ge => CmpOp::Ge,
            Comparator::Eq => CmpOp::Eq,
        };
        self.model.add_linear(expr, cmp, rhs);
        Ok(())
    }

    /// Relaxes `expr <op> rhs` with a non-negative slack variable whose
    /// upper bound is the statically derived worst-case violation, and
    /// charges `slack · penalty` to the objective. With a worst case of
    /// zero the constraint cannot be meaningfully violated: no penalty term
    /// is emitted and the constraint is not tracked.
    fn add_soft_linear(&mut self, constraint: &Constraint) -> Result<()> {
        let (terms, op, rhs) = self.require_linear_fields(constraint)?;
        let penalty = constraint
            .penalty
            .ok_or_else(|| CompileError::missing_field(constraint.kind.name(), "penalty"))?;

        let (min_expr, max_expr) = expression_range(terms, &self.bounds)?;
        let expr = self.linear_expr(terms)?;

        let ordinal = self.soft_ordinal;
        self.soft_ordinal += 1;
        // The synthetic id only labels the slack variable; tracking is
        // gated on the caller having supplied an id of their own.
        let constraint_id = constraint
            .id
            .clone()
            .unwrap_or_else(|| format!("soft_{ordinal}"));
        let slack_name = format!("violation_{constraint_id}");

        let (max_violation, violation) = match op {
            Comparator::Le => {
                let max_violation = violation_bound((max_expr - i128::from(rhs)).max(0))?;
                let violation = self.model.new_int_var(0, max_violation, slack_name);
                // expr <= rhs + violation
                let mut relaxed = expr;
                relaxed.add_term(violation, -1);
                self.model.add_linear(relaxed, CmpOp::Le, rhs);
                (max_violation, violation)
            }
            Comparator::Ge => {
                let max_violation = violation_bound((i128::from(rhs) - min_expr).max(0))?;
                let violation = self.model.new_int_var(0, max_violation, slack_name);
                // expr + violation >= rhs
                let mut relaxed = expr;
                relaxed.add_term(violation, 1);
                self.model.add_linear(relaxed, CmpOp::Ge, rhs);
                (max_violation, violation)
            }
            Comparator::Eq => {
                return Err(CompileError::UnsupportedOperator {
                    kind: "soft_linear",
                    op: op.to_string(),
                })
            }
        };

        if max_violation > 0 {
            self.penalty_terms.add_term(violation, penalty);
            if constraint.id.is_some() {
                self.tracked_soft.push(TrackedSoftConstraint {
                    id: constraint_id,
                    violation_var: violation,
                    target_value: rhs,
                    comparator: op,
                    terms: terms.to_vec(),
                });
            }
        }
        Ok(())
    }

    fn add_implication(&mut self, constraint: &Constraint) -> Result<()> {
        let kind = constraint.kind.name();
        let premise = constraint
            .if_var
            .as_deref()
            .ok_or_else(|| CompileError::missing_field(kind, "if"))?;
        let conclusion = constraint
            .then
            .as_deref()
            .ok_or_else(|| CompileError::missing_field(kind, "then"))?;
        let premise = self.resolve_bool(premise)?;
        let conclusion = self.resolve_bool(conclusion)?;
        self.model.add_implication(premise, conclusion);
        Ok(())
    }

    fn add_no_overlap(&mut self, constraint: &Constraint) -> Result<()> {
        let kind = constraint.kind.name();
        let names = match &constraint.intervals {
            Some(names) if !names.is_empty() => names,
            _ => return Err(CompileError::missing_field(kind, "intervals")),
        };
        let ids = names
            .iter()
            .map(|name| {
                self.intervals
                    .get(name)
                    .copied()
                    .ok_or_else(|| CompileError::UnknownVariable(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.model.add_no_overlap(ids);
        Ok(())
    }

    /// Combines the user objective with the accumulated penalty terms into
    /// at most one optimization direction. Penalties always count as cost:
    /// added under minimize, subtracted under maximize. Returns whether an
    /// objective was sent at all.
    fn assemble_objective(&mut self, objective: Option<&Objective>) -> Result<bool> {
        let penalties =
            (!self.penalty_terms.is_empty()).then(|| self.penalty_terms.clone());

        let Some(objective) = objective else {
            if let Some(penalties) = penalties {
                self.model.minimize(penalties);
                return Ok(true);
            }
            return Ok(false);
        };

        let user = self.linear_expr(&objective.terms)?;
        let user = (!user.is_empty()).then_some(user);

        let expr = match (user, penalties) {
            (Some(mut user), Some(penalties)) => {
                match objective.sense {
                    ObjectiveSense::Minimize => user.add_expr(&penalties),
                    ObjectiveSense::Maximize => user.add_expr(&penalties.negated()),
                }
                Some(user)
            }
            (Some(user), None) => Some(user),
            (None, Some(penalties)) => Some(match objective.sense {
                ObjectiveSense::Minimize => penalties,
                ObjectiveSense::Maximize => penalties.negated(),
            }),
            (None, None) => None,
        };

        match expr {
            Some(expr) => {
                match objective.sense {
                    ObjectiveSense::Minimize => self.model.minimize(expr),
                    ObjectiveSense::Maximize => self.model.maximize(expr),
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn finish(self, has_objective: bool) -> CompiledModel {
        CompiledModel {
            model: self.model,
            scalar_vars: self
                .scalars
                .into_iter()
                .map(|(name, handle)| (name, handle.id))
                .collect(),
            has_objective,
            tracked_soft: self.tracked_soft,
        }
    }
}
