//! Error types for model compilation.

use thiserror::Error;

/// Errors detected while compiling a request into an engine model.
///
/// All of these are configuration errors: they describe malformed or
/// inconsistent request content and are raised before the engine is ever
/// invoked. The service boundary converts every one of them into a response
/// with status `ERROR` and the error's message.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A variable declaration is missing required bound fields (`min`/`max`
    /// for integers, `start`/`end`/`size` for intervals).
    #[error("{kind} variable {name} requires {fields}")]
    MissingBound {
        kind: &'static str,
        name: String,
        fields: &'static str,
    },

    /// An integer variable was declared with crossed bounds.
    #[error("int variable {name} has invalid bounds: min={min} > max={max}")]
    InvalidBounds { name: String, min: i64, max: i64 },

    /// A constraint, objective term, or presence reference named a variable
    /// that was never declared (or is of the wrong class for the reference).
    #[error("unknown variable {0}")]
    UnknownVariable(String),

    /// An interval's declared span does not match its size.
    #[error("interval variable {name} inconsistent: end-start={span} != size={size}")]
    IntervalInconsistent { name: String, span: i64, size: i64 },

    /// A constraint is missing a required field, or carries a field that
    /// belongs to a different constraint kind.
    #[error("{kind} constraint {problem}")]
    MalformedConstraint {
        kind: &'static str,
        problem: String,
    },

    /// A comparator the given constraint kind cannot express.
    #[error("unsupported {kind} operator {op}")]
    UnsupportedOperator { kind: &'static str, op: String },

    /// A statically derived bound does not fit the engine's value range.
    #[error("{kind} constraint bound overflows: {value} is outside the supported integer range")]
    BoundOverflow { kind: &'static str, value: i128 },

    /// The requested time limit is not a usable number of seconds.
    #[error("invalid time limit {0}: must be a finite, non-negative number of seconds")]
    InvalidTimeLimit(f64),
}

impl CompileError {
    /// A required field of a constraint variant is absent.
    pub fn missing_field(kind: &'static str, field: &'static str) -> Self {
        CompileError::MalformedConstraint {
            kind,
            problem: format!("requires {field}"),
        }
    }

    /// A field belonging to another constraint variant is present.
    pub fn foreign_field(kind: &'static str, field: &'static str) -> Self {
        CompileError::MalformedConstraint {
            kind,
            problem: format!("does not accept field {field}"),
        }
    }
}

/// Result type alias for compilation steps.
pub type Result<T> = std::result::Result<T, CompileError>;
