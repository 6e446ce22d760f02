//! Static bounds for numeric variables and interval arithmetic over
//! linear expressions.

use std::collections::HashMap;

use shiftplan_core::{CompileError, Result, Term, Variable, VariableKind};

/// Static `[lower, upper]` range of one numeric variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableBounds {
    pub lower: i64,
    pub upper: i64,
}

/// Computes the static range of every boolean and integer variable.
///
/// Interval variables are skipped entirely: they never participate in
/// linear expressions, so a linear term naming one later fails name
/// resolution against this map.
pub fn collect_bounds(variables: &[Variable]) -> Result<HashMap<String, VariableBounds>> {
    let mut bounds = HashMap::new();
    for var in variables {
        match var.kind {
            VariableKind::Bool => {
                bounds.insert(var.name.clone(), VariableBounds { lower: 0, upper: 1 });
            }
            VariableKind::Int => {
                let (Some(min), Some(max)) = (var.min, var.max) else {
                    return Err(CompileError::MissingBound {
                        kind: "int",
                        name: var.name.clone(),
                        fields: "min and max",
                    });
                };
                if min > max {
                    return Err(CompileError::InvalidBounds {
                        name: var.name.clone(),
                        min,
                        max,
                    });
                }
                bounds.insert(
                    var.name.clone(),
                    VariableBounds {
                        lower: min,
                        upper: max,
                    },
                );
            }
            VariableKind::Interval => {}
        }
    }
    Ok(bounds)
}

/// `[lo, hi]` of a single term `coeff · var` over the variable's range.
///
/// Widened to `i128`: coefficient times bound can exceed `i64` even when
/// both fields are individually valid.
pub fn term_range(term: &Term, bounds: VariableBounds) -> (i128, i128) {
    let coeff = i128::from(term.coeff);
    let a = coeff * i128::from(bounds.lower);
    let b = coeff * i128::from(bounds.upper);
    (a.min(b), a.max(b))
}

/// `[lo, hi]` of `Σ coeff · var`, folded across all terms in `i128`.
pub fn expression_range(
    terms: &[Term],
    bounds: &HashMap<String, VariableBounds>,
) -> Result<(i128, i128)> {
    let mut min_expr = 0i128;
    let mut max_expr = 0i128;
    for term in terms {
        let Some(var_bounds) = bounds.get(&term.var) else {
            return Err(CompileError::UnknownVariable(term.var.clone()));
        };
        let (lo, hi) = term_range(term, *var_bounds);
        min_expr += lo;
        max_expr += hi;
    }
    Ok((min_expr, max_expr))
}
