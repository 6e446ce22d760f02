//! End-to-end tests over compile + solve + extract.

use shiftplan_core::{ResponseStatus, SolveRequest};

use super::solve_request;

fn request(json: &str) -> SolveRequest {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_linear_feasible_solution() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 1}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let values = response.values.unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values["x"], 1);
}

#[test]
fn test_soft_linear_penalty_drives_feasible_choice() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": "<=", "rhs": 0, "penalty": 10}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    assert_eq!(response.values.unwrap()["x"], 0);
    let statistics = response.statistics.unwrap();
    assert!(statistics.objective_value.is_some());
}

#[test]
fn test_penalty_offsets_maximize_objective() {
    // Penalty (15) outweighs reward (10) so the solver prefers x=0.
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": "<=", "rhs": 0, "penalty": 15}
            ],
            "objective": {"sense": "maximize", "terms": [{"var": "x", "coeff": 10}]}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    assert_eq!(response.values.unwrap()["x"], 0);
}

#[test]
fn test_penalty_added_under_minimize_objective() {
    // Reward for x=1 is -1 under minimize; the penalty of 5 dominates.
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": "<=", "rhs": 0, "penalty": 5}
            ],
            "objective": {"sense": "minimize", "terms": [{"var": "x", "coeff": -1}]}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    assert_eq!(response.values.unwrap()["x"], 0);
}

#[test]
fn test_exactly_one_constraint() {
    let response = solve_request(&request(
        r#"{
            "variables": [
                {"type": "bool", "name": "a"},
                {"type": "bool", "name": "b"},
                {"type": "bool", "name": "c"}
            ],
            "constraints": [{"type": "exactly_one", "vars": ["a", "b", "c"]}],
            "objective": {"sense": "minimize", "terms": [{"var": "b", "coeff": 1}]}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let values = response.values.unwrap();
    assert_eq!(values.values().sum::<i64>(), 1);
    assert_eq!(values["b"], 0);
}

#[test]
fn test_implication_enforced() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}, {"type": "bool", "name": "y"}],
            "constraints": [{"type": "implication", "if": "x", "then": "y"}],
            "objective": {
                "sense": "maximize",
                "terms": [{"var": "x", "coeff": 1}, {"var": "y", "coeff": 2}]
            }
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let values = response.values.unwrap();
    assert_eq!(values["x"], 1);
    assert_eq!(values["y"], 1);
}

#[test]
fn test_soft_constraint_reports_violation_when_id_provided() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 0},
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": ">=", "rhs": 1,
                 "penalty": 5, "id": "coverage:test:2024-02-01:540"}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let violations = response.soft_violations.unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].constraint_id, "coverage:test:2024-02-01:540");
    assert_eq!(violations[0].violation_amount, 1);
    assert_eq!(violations[0].target_value, 1);
    assert_eq!(violations[0].actual_value, 0);
}

#[test]
fn test_soft_constraint_without_id_is_penalized_but_not_reported() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 0},
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": ">=", "rhs": 1, "penalty": 5}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    // The penalty still entered the objective.
    assert_eq!(response.statistics.unwrap().objective_value, Some(5.0));
    // But an id-less soft constraint is never individually reported.
    assert!(response.soft_violations.is_none());
}

#[test]
fn test_structurally_unviolable_soft_constraint_is_ignored() {
    // x is 0/1 so max(0, 1 - 1) = 0: no penalty term, no tracking, even
    // though an id was supplied.
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": "<=", "rhs": 1,
                 "penalty": 100, "id": "never-violated"}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    assert!(response.soft_violations.is_none());
    // No penalty terms and no user objective means pure feasibility.
    assert!(response.statistics.unwrap().objective_value.is_none());
}

#[test]
fn test_violation_never_exceeds_static_maximum() {
    // x in [0,10], soft x <= 3: worst case violation is 7. A hard
    // constraint forces x = 9, so the reported violation is 6.
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "x", "min": 0, "max": 10}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 9},
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": "<=", "rhs": 3,
                 "penalty": 2, "id": "cap"}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let violations = response.soft_violations.unwrap();
    assert_eq!(violations[0].violation_amount, 6);
    assert!(violations[0].violation_amount <= 7);
    assert_eq!(violations[0].actual_value, 9);
    assert_eq!(violations[0].target_value, 3);
}

#[test]
fn test_infeasible_solution_reports_solution_info() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 0},
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 1}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Infeasible);
    assert!(!response.solution_info.unwrap().is_empty());
    assert!(response.values.is_none());
    assert!(response.statistics.is_none());
}

#[test]
fn test_no_overlap_with_optional_intervals() {
    let response = solve_request(&request(
        r#"{
            "variables": [
                {"type": "bool", "name": "p"},
                {"type": "bool", "name": "q"},
                {"type": "interval", "name": "first", "start": 0, "end": 10, "size": 10, "presenceVar": "p"},
                {"type": "interval", "name": "second", "start": 5, "end": 15, "size": 10, "presenceVar": "q"}
            ],
            "constraints": [{"type": "no_overlap", "intervals": ["first", "second"]}],
            "objective": {
                "sense": "maximize",
                "terms": [{"var": "p", "coeff": 1}, {"var": "q", "coeff": 1}]
            }
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let values = response.values.unwrap();
    assert_eq!(values["p"] + values["q"], 1);
    // Interval variables are not scalar values.
    assert!(!values.contains_key("first"));
}

#[test]
fn test_missing_int_bounds_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "load", "min": 0}],
            "constraints": []
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    let error = response.error.unwrap();
    assert!(error.contains("load"));
    assert!(error.contains("requires min and max"));
}

#[test]
fn test_crossed_int_bounds_fail_before_the_engine() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "load", "min": 5, "max": 2}],
            "constraints": []
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("invalid bounds"));
    // Compilation failed, so no engine statistics exist.
    assert!(response.statistics.is_none());
}

#[test]
fn test_oversized_soft_bound_is_an_error_not_a_panic() {
    // coeff · max is ~1.6e19, past what the engine can represent. The
    // derived violation bound must come back as a configuration error.
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "load", "min": 0, "max": 4000000000}],
            "constraints": [
                {"type": "soft_linear", "terms": [{"var": "load", "coeff": 4000000000}],
                 "op": "<=", "rhs": 0, "penalty": 1, "id": "huge"}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("overflow"));
    assert!(response.statistics.is_none());
}

#[test]
fn test_expression_range_widens_past_i64() {
    // coeff · max alone is ~1.6e19 > i64::MAX; the fold must not wrap.
    let mut bounds = std::collections::HashMap::new();
    bounds.insert(
        "load".to_string(),
        crate::bounds::VariableBounds {
            lower: 0,
            upper: 4_000_000_000,
        },
    );
    let terms = vec![shiftplan_core::Term {
        var: "load".to_string(),
        coeff: 4_000_000_000,
    }];

    let (lo, hi) = crate::bounds::expression_range(&terms, &bounds).unwrap();

    assert_eq!(lo, 0);
    assert_eq!(hi, 16_000_000_000_000_000_000i128);
}

#[test]
fn test_unknown_variable_reference_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "ghost", "coeff": 1}], "op": "<=", "rhs": 1}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("unknown variable ghost"));
}

#[test]
fn test_interval_name_in_linear_term_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [
                {"type": "interval", "name": "shift", "start": 0, "end": 8, "size": 8}
            ],
            "constraints": [
                {"type": "linear", "terms": [{"var": "shift", "coeff": 1}], "op": ">=", "rhs": 1}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("unknown variable shift"));
}

#[test]
fn test_inconsistent_interval_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [
                {"type": "interval", "name": "shift", "start": 0, "end": 8, "size": 6}
            ],
            "constraints": []
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    let error = response.error.unwrap();
    assert!(error.contains("shift"));
    assert!(error.contains("inconsistent"));
}

#[test]
fn test_unknown_presence_variable_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [
                {"type": "interval", "name": "shift", "start": 0, "end": 8, "size": 8, "presenceVar": "works"}
            ],
            "constraints": []
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("unknown variable works"));
}

#[test]
fn test_presence_variable_must_be_boolean() {
    let response = solve_request(&request(
        r#"{
            "variables": [
                {"type": "int", "name": "works", "min": 0, "max": 3},
                {"type": "interval", "name": "shift", "start": 0, "end": 8, "size": 8, "presenceVar": "works"}
            ],
            "constraints": []
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("unknown variable works"));
}

#[test]
fn test_soft_equality_operator_is_unsupported() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 1, "penalty": 3}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    let error = response.error.unwrap();
    assert!(error.contains("unsupported"));
    assert!(error.contains("=="));
}

#[test]
fn test_missing_constraint_field_names_the_field() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "rhs": 1}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("linear constraint requires op"));
}

#[test]
fn test_foreign_constraint_field_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "exactly_one", "vars": ["x"], "penalty": 4}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response
        .error
        .unwrap()
        .contains("exactly_one constraint does not accept field penalty"));
}

#[test]
fn test_empty_vars_list_is_an_error() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [{"type": "bool_or", "vars": []}]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("bool_or constraint requires vars"));
}

#[test]
fn test_zero_time_limit_reports_timeout() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 1}
            ],
            "options": {"timeLimitSeconds": 0.0}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Timeout);
    assert!(response.values.is_none());
    assert!(response.solution_info.is_some());
}

#[test]
fn test_negative_time_limit_is_rejected() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": [],
            "options": {"timeLimitSeconds": -1.5}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.unwrap().contains("invalid time limit"));
    assert!(response.values.is_none());
}

#[test]
fn test_solution_limit_one_stops_at_first_solution() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "x", "min": 0, "max": 50}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": ">=", "rhs": 0}
            ],
            "objective": {"sense": "minimize", "terms": [{"var": "x", "coeff": 1}]},
            "options": {"solutionLimit": 1}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Feasible);
    assert!(response.values.is_some());
}

#[test]
fn test_other_solution_limits_are_ignored() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "x", "min": 0, "max": 5}],
            "constraints": [],
            "objective": {"sense": "minimize", "terms": [{"var": "x", "coeff": 1}]},
            "options": {"solutionLimit": 3}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    assert_eq!(response.values.unwrap()["x"], 0);
}

#[test]
fn test_pure_feasibility_omits_objective_statistics() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "bool", "name": "x"}],
            "constraints": []
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let statistics = response.statistics.unwrap();
    assert!(statistics.objective_value.is_none());
    assert!(statistics.best_objective_bound.is_none());
}

#[test]
fn test_objective_statistics_present_when_objective_sent() {
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "x", "min": 2, "max": 9}],
            "constraints": [],
            "objective": {"sense": "minimize", "terms": [{"var": "x", "coeff": 3}]}
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let statistics = response.statistics.unwrap();
    assert_eq!(statistics.objective_value, Some(6.0));
    assert_eq!(statistics.best_objective_bound, Some(6.0));
}

#[test]
fn test_negative_coefficient_soft_range() {
    // -x over [0,4] ranges [-4,0]; soft -x >= -1 has worst case
    // max(0, -1 - (-4)) = 3. Forcing x = 4 violates by 3 exactly.
    let response = solve_request(&request(
        r#"{
            "variables": [{"type": "int", "name": "x", "min": 0, "max": 4}],
            "constraints": [
                {"type": "linear", "terms": [{"var": "x", "coeff": 1}], "op": "==", "rhs": 4},
                {"type": "soft_linear", "terms": [{"var": "x", "coeff": -1}], "op": ">=", "rhs": -1,
                 "penalty": 1, "id": "neg"}
            ]
        }"#,
    ));

    assert_eq!(response.status, ResponseStatus::Optimal);
    let violations = response.soft_violations.unwrap();
    assert_eq!(violations[0].violation_amount, 3);
    assert_eq!(violations[0].actual_value, -4);
    assert_eq!(violations[0].target_value, -1);
}
