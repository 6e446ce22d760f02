//! Branch-and-bound search over the model.
//!
//! Depth-first search in declaration order with partial-assignment
//! consistency checks: a constraint prunes as soon as the assigned prefix
//! plus the bounds of the unassigned suffix can no longer satisfy it. With
//! an objective the search keeps the best incumbent and prunes branches
//! whose optimistic bound cannot beat it; without one the first feasible
//! assignment completes the search.

use std::time::{Duration, Instant};

use crate::model::{CmpOp, LinearExpr, Model, NativeConstraint, Sense, SolveParams, VarId};

/// Raw verdict of one search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Search completed with a solution: proven optimal (or, without an
    /// objective, proven feasible).
    Optimal,
    /// A solution was found but the search stopped before a proof (time
    /// limit, or stop-after-first mode).
    Feasible,
    /// Search completed without finding any solution.
    Infeasible,
    /// The model is structurally unsolvable as posed (empty domain,
    /// inconsistent interval).
    Invalid,
    /// The time limit expired before any solution was found.
    Unknown,
}

/// A concrete value for every scalar variable.
#[derive(Debug, Clone)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.0]
    }
}

/// Search statistics for one solve call.
#[derive(Debug, Clone, Default)]
pub struct SolveStats {
    pub wall_time: Duration,
    /// Value assignments tried.
    pub branches: u64,
    /// Assignments rejected by a consistency or bound check.
    pub conflicts: u64,
    /// Achieved objective value, when an objective was set and a solution
    /// was found.
    pub objective_value: Option<f64>,
    /// Best proven bound on the objective.
    pub best_objective_bound: Option<f64>,
}

/// Outcome of one solve call.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub solution: Option<Assignment>,
    pub stats: SolveStats,
    /// Free-text diagnostic, set for non-success verdicts.
    pub info: Option<String>,
}

/// Pairwise overlap obligation derived from a no-overlap constraint: the two
/// intervals occupy intersecting time ranges, so they must not both be
/// present. `None` presence means always present.
#[derive(Debug, Clone, Copy)]
struct OverlapPair {
    first: Option<VarId>,
    second: Option<VarId>,
}

struct Searcher<'m> {
    model: &'m Model,
    overlap_pairs: Vec<OverlapPair>,
    minimize: Option<LinearExpr>,
    sense: Sense,
    values: Vec<i64>,
    assigned: Vec<bool>,
    deadline: Instant,
    stop_after_first: bool,
    branches: u64,
    conflicts: u64,
    incumbent: Option<(Vec<i64>, i128)>,
    timed_out: bool,
    stopped_early: bool,
}

/// Solves the model within the given time budget.
pub fn solve(model: &Model, params: &SolveParams) -> SolveResult {
    let started = Instant::now();

    if let Err(err) = model.validate() {
        return SolveResult {
            status: SolveStatus::Invalid,
            solution: None,
            stats: SolveStats {
                wall_time: started.elapsed(),
                ..SolveStats::default()
            },
            info: Some(err.to_string()),
        };
    }

    // Normalize to minimization: a maximize objective is searched as the
    // negated expression and converted back in the reported statistics.
    let (sense, minimize) = match &model.objective {
        Some((Sense::Minimize, expr)) => (Sense::Minimize, Some(expr.clone())),
        Some((Sense::Maximize, expr)) => (Sense::Maximize, Some(expr.negated())),
        None => (Sense::Minimize, None),
    };

    let deadline = started
        .checked_add(params.time_limit)
        .unwrap_or_else(|| started + Duration::from_secs(u32::MAX as u64));

    let mut searcher = Searcher {
        model,
        overlap_pairs: collect_overlap_pairs(model),
        minimize,
        sense,
        values: vec![0; model.num_vars()],
        assigned: vec![false; model.num_vars()],
        deadline,
        stop_after_first: params.stop_after_first,
        branches: 0,
        conflicts: 0,
        incumbent: None,
        timed_out: false,
        stopped_early: false,
    };

    if searcher.consistent() {
        searcher.dfs(0);
    } else {
        searcher.conflicts += 1;
    }

    searcher.into_result(started.elapsed())
}

fn collect_overlap_pairs(model: &Model) -> Vec<OverlapPair> {
    let mut pairs = Vec::new();
    for constraint in &model.constraints {
        let NativeConstraint::NoOverlap(ids) = constraint else {
            continue;
        };
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                let ia = &model.intervals[a.0];
                let ib = &model.intervals[b.0];
                if ia.start < ib.end && ib.start < ia.end {
                    pairs.push(OverlapPair {
                        first: ia.presence,
                        second: ib.presence,
                    });
                }
            }
        }
    }
    pairs
}

impl Searcher<'_> {
    /// Returns false to abort the search (timeout, early stop, or a
    /// feasibility problem already solved).
    fn dfs(&mut self, depth: usize) -> bool {
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return false;
        }
        if depth == self.model.num_vars() {
            return self.record_solution();
        }

        let (lower, upper) = {
            let def = &self.model.vars[depth];
            (def.lower, def.upper)
        };
        for value in lower..=upper {
            self.branches += 1;
            // A wide domain whose values all conflict never recurses, so
            // the deadline is re-checked here too, amortized over batches
            // of branches.
            if (self.branches & 1023) == 0 && Instant::now() >= self.deadline {
                self.timed_out = true;
                return false;
            }
            self.values[depth] = value;
            self.assigned[depth] = true;
            let keep = if self.consistent() && self.bound_can_improve() {
                self.dfs(depth + 1)
            } else {
                self.conflicts += 1;
                true
            };
            self.assigned[depth] = false;
            if !keep {
                return false;
            }
        }
        true
    }

    fn record_solution(&mut self) -> bool {
        let objective = self
            .minimize
            .as_ref()
            .map(|expr| self.assigned_value(expr))
            .unwrap_or(0);
        let improved = match &self.incumbent {
            None => true,
            Some((_, best)) => objective < *best,
        };
        if improved {
            self.incumbent = Some((self.values.clone(), objective));
        }
        if self.stop_after_first {
            self.stopped_early = true;
            return false;
        }
        // Pure feasibility: the first solution is a proof.
        self.minimize.is_some()
    }

    fn assigned_value(&self, expr: &LinearExpr) -> i128 {
        expr.terms()
            .iter()
            .map(|&(v, c)| c as i128 * self.values[v.0] as i128)
            .sum()
    }

    /// `[lo, hi]` of the expression given the assigned prefix and the
    /// domains of the unassigned variables.
    fn expr_bounds(&self, expr: &LinearExpr) -> (i128, i128) {
        let mut lo = 0i128;
        let mut hi = 0i128;
        for &(var, coeff) in expr.terms() {
            let coeff = coeff as i128;
            if self.assigned[var.0] {
                let contribution = coeff * self.values[var.0] as i128;
                lo += contribution;
                hi += contribution;
            } else {
                let def = &self.model.vars[var.0];
                let a = coeff * def.lower as i128;
                let b = coeff * def.upper as i128;
                lo += a.min(b);
                hi += a.max(b);
            }
        }
        (lo, hi)
    }

    fn bound_can_improve(&self) -> bool {
        let (Some(expr), Some((_, best))) = (&self.minimize, &self.incumbent) else {
            return true;
        };
        let (lo, _) = self.expr_bounds(expr);
        lo < *best
    }

    fn literal(&self, var: VarId) -> Option<bool> {
        self.assigned[var.0].then(|| self.values[var.0] != 0)
    }

    /// True while no constraint is certainly violated under the current
    /// partial assignment.
    fn consistent(&self) -> bool {
        for constraint in &self.model.constraints {
            let ok = match constraint {
                NativeConstraint::Linear { expr, op, rhs } => {
                    let (lo, hi) = self.expr_bounds(expr);
                    let rhs = *rhs as i128;
                    match op {
                        CmpOp::Le => lo <= rhs,
                        CmpOp::Ge => hi >= rhs,
                        CmpOp::Eq => lo <= rhs && rhs <= hi,
                    }
                }
                NativeConstraint::ExactlyOne(literals) => {
                    let (ones, unassigned) = self.count_literals(literals);
                    ones <= 1 && ones + unassigned >= 1
                }
                NativeConstraint::AtMostOne(literals) => {
                    let (ones, _) = self.count_literals(literals);
                    ones <= 1
                }
                NativeConstraint::Implication {
                    premise,
                    conclusion,
                } => !(self.literal(*premise) == Some(true)
                    && self.literal(*conclusion) == Some(false)),
                NativeConstraint::BoolOr(literals) => {
                    let (ones, unassigned) = self.count_literals(literals);
                    ones + unassigned >= 1
                }
                NativeConstraint::BoolAnd(literals) => literals
                    .iter()
                    .all(|&lit| self.literal(lit) != Some(false)),
                // Handled via the precomputed pair list below.
                NativeConstraint::NoOverlap(_) => true,
            };
            if !ok {
                return false;
            }
        }
        for pair in &self.overlap_pairs {
            let first = match pair.first {
                None => Some(true),
                Some(var) => self.literal(var),
            };
            let second = match pair.second {
                None => Some(true),
                Some(var) => self.literal(var),
            };
            if first == Some(true) && second == Some(true) {
                return false;
            }
        }
        true
    }

    fn count_literals(&self, literals: &[VarId]) -> (usize, usize) {
        let mut ones = 0;
        let mut unassigned = 0;
        for &lit in literals {
            match self.literal(lit) {
                Some(true) => ones += 1,
                Some(false) => {}
                None => unassigned += 1,
            }
        }
        (ones, unassigned)
    }

    fn into_result(self, wall_time: Duration) -> SolveResult {
        let status = if self.timed_out {
            if self.incumbent.is_some() {
                SolveStatus::Feasible
            } else {
                SolveStatus::Unknown
            }
        } else if self.stopped_early {
            SolveStatus::Feasible
        } else if self.incumbent.is_some() {
            SolveStatus::Optimal
        } else {
            SolveStatus::Infeasible
        };

        let mut stats = SolveStats {
            wall_time,
            branches: self.branches,
            conflicts: self.conflicts,
            objective_value: None,
            best_objective_bound: None,
        };

        let mut solution = None;
        if let Some((values, internal)) = &self.incumbent {
            solution = Some(Assignment {
                values: values.clone(),
            });
            if let Some(expr) = &self.minimize {
                let achieved = from_internal(*internal, self.sense);
                stats.objective_value = Some(achieved);
                stats.best_objective_bound = Some(match status {
                    SolveStatus::Optimal => achieved,
                    // Root relaxation: the best the objective could reach
                    // over the raw variable domains.
                    _ => {
                        let (lo, _) = root_bounds(self.model, expr);
                        from_internal(lo, self.sense)
                    }
                });
            }
        }

        let info = match status {
            SolveStatus::Infeasible => Some(format!(
                "search exhausted after {} branches: no feasible assignment",
                self.branches
            )),
            SolveStatus::Unknown => {
                Some("time limit reached before a feasible solution was found".to_string())
            }
            SolveStatus::Feasible if self.stopped_early => {
                Some("stopped after first feasible solution".to_string())
            }
            SolveStatus::Feasible => {
                Some("time limit reached before optimality was proven".to_string())
            }
            _ => None,
        };

        SolveResult {
            status,
            solution,
            stats,
            info,
        }
    }
}

/// `[lo, hi]` of the expression over the raw variable domains.
fn root_bounds(model: &Model, expr: &LinearExpr) -> (i128, i128) {
    let mut lo = 0i128;
    let mut hi = 0i128;
    for &(var, coeff) in expr.terms() {
        let def = &model.vars[var.0];
        let coeff = coeff as i128;
        let a = coeff * def.lower as i128;
        let b = coeff * def.upper as i128;
        lo += a.min(b);
        hi += a.max(b);
    }
    (lo, hi)
}

fn from_internal(value: i128, sense: Sense) -> f64 {
    match sense {
        Sense::Minimize => value as f64,
        Sense::Maximize => -(value as f64),
    }
}
