//! Response-side wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Final verdict of a solve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Optimal,
    Feasible,
    Infeasible,
    Timeout,
    Error,
}

/// One soft constraint violation in the solver output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SoftViolation {
    pub constraint_id: String,
    pub violation_amount: i64,
    pub target_value: i64,
    pub actual_value: i64,
}

/// Solve statistics. Objective fields are present only when an optimization
/// direction was sent to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Statistics {
    pub solve_time_ms: i64,
    pub conflicts: i64,
    pub branches: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_objective_bound: Option<f64>,
}

/// Response payload produced by the solver service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SolveResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_violations: Option<Vec<SoftViolation>>,
}

impl SolveResponse {
    /// A response carrying only a status and an optional engine diagnostic.
    pub fn status_only(status: ResponseStatus, solution_info: Option<String>) -> Self {
        SolveResponse {
            status,
            values: None,
            statistics: None,
            error: None,
            solution_info,
            soft_violations: None,
        }
    }

    /// An `ERROR` response carrying a failure message.
    pub fn error(message: impl Into<String>) -> Self {
        SolveResponse {
            status: ResponseStatus::Error,
            values: None,
            statistics: None,
            error: Some(message.into()),
            solution_info: None,
            soft_violations: None,
        }
    }
}
