//! Engine invocation and solution extraction.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, warn};

use shiftplan_core::{
    CompileError, ResponseStatus, Result, SoftViolation, SolveOptions, SolveRequest,
    SolveResponse, Statistics,
};
use shiftplan_solver::{SolveParams, SolveStatus};

use crate::compile::{compile, CompiledModel};

/// Compiles and solves one request.
///
/// This is the single catch-all boundary: any compilation error becomes a
/// response with status `ERROR` and the error's message, never a partial
/// success. Engine outcomes (infeasible, timeout) are statuses, not errors.
pub fn solve_request(request: &SolveRequest) -> SolveResponse {
    match solve_inner(request) {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "request rejected during compilation");
            SolveResponse::error(err.to_string())
        }
    }
}

fn solve_inner(request: &SolveRequest) -> Result<SolveResponse> {
    let compiled = compile(request)?;
    debug!(
        variables = compiled.model.num_vars(),
        intervals = compiled.model.num_intervals(),
        tracked_soft = compiled.tracked_soft.len(),
        has_objective = compiled.has_objective,
        "model compiled"
    );

    let options = request.options.clone().unwrap_or_default();
    let params = SolveParams {
        time_limit: time_limit(&options)?,
        // Only a solution limit of exactly 1 means anything: stop at the
        // first feasible solution.
        stop_after_first: options.solution_limit == Some(1),
    };

    let result = shiftplan_solver::solve(&compiled.model, &params);
    let status = map_status(result.status);
    debug!(?status, branches = result.stats.branches, "engine returned");

    if !matches!(status, ResponseStatus::Optimal | ResponseStatus::Feasible) {
        return Ok(SolveResponse::status_only(status, result.info));
    }

    let Some(assignment) = result.solution else {
        return Ok(SolveResponse::error(
            "engine reported success without an assignment",
        ));
    };

    let mut values = BTreeMap::new();
    for (name, &var) in &compiled.scalar_vars {
        values.insert(name.clone(), assignment.value(var));
    }

    let statistics = Statistics {
        solve_time_ms: result.stats.wall_time.as_millis() as i64,
        conflicts: result.stats.conflicts as i64,
        branches: result.stats.branches as i64,
        objective_value: compiled.has_objective.then(|| result.stats.objective_value).flatten(),
        best_objective_bound: compiled
            .has_objective
            .then(|| result.stats.best_objective_bound)
            .flatten(),
    };

    let soft_violations = extract_soft_violations(&compiled, &assignment);

    Ok(SolveResponse {
        status,
        values: Some(values),
        statistics: Some(statistics),
        error: None,
        solution_info: None,
        soft_violations: (!soft_violations.is_empty()).then_some(soft_violations),
    })
}

/// A zero limit is a legal (if useless) budget; negative or non-finite
/// values are configuration errors.
fn time_limit(options: &SolveOptions) -> Result<Duration> {
    let seconds = options.time_limit_seconds;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CompileError::InvalidTimeLimit(seconds));
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Fixed status table from engine verdicts to the response vocabulary.
fn map_status(status: SolveStatus) -> ResponseStatus {
    match status {
        SolveStatus::Optimal => ResponseStatus::Optimal,
        SolveStatus::Feasible => ResponseStatus::Feasible,
        SolveStatus::Infeasible => ResponseStatus::Infeasible,
        SolveStatus::Invalid => ResponseStatus::Error,
        SolveStatus::Unknown => ResponseStatus::Timeout,
    }
}

/// Reconstructs which tracked soft constraints were actually violated.
///
/// A constraint appears only when its slack resolved strictly positive; the
/// actual left-hand side is recomputed from the original terms against the
/// returned assignment.
fn extract_soft_violations(
    compiled: &CompiledModel,
    assignment: &shiftplan_solver::Assignment,
) -> Vec<SoftViolation> {
    let mut violations = Vec::new();
    for tracked in &compiled.tracked_soft {
        let amount = assignment.value(tracked.violation_var);
        if amount <= 0 {
            continue;
        }
        let actual: i64 = tracked
            .terms
            .iter()
            .map(|term| assignment.value(compiled.scalar_vars[&term.var]) * term.coeff)
            .sum();
        violations.push(SoftViolation {
            constraint_id: tracked.id.clone(),
            violation_amount: amount,
            target_value: tracked.target_value,
            actual_value: actual,
        });
    }
    violations
}
