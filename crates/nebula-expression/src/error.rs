//! Errors specific to lexing/parsing/evaluating an expression.
//!
//! Kept distinct from [`nebula_error::Error`] because the template
//! resolver (§4.1) needs to distinguish "not an expression at all, fall
//! back to a path lookup" from the handful of genuine evaluation
//! failures (division by zero, unknown function) that a `condition` or
//! `math` node wants surfaced as a `template`-kind [`nebula_error::Error`].

/// Failure evaluating an expression string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    /// Lexer encountered a character it does not recognise.
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    /// Parser expected a token that was not present.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// Parser found a token it did not expect.
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    /// Division (or modulo) by zero.
    #[error("arith: division by zero")]
    DivisionByZero,
    /// Reference to a function name not in the built-in set.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// A function was called with the wrong number of arguments.
    #[error("function {name} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Expected argument count.
        expected: usize,
        /// Actual argument count supplied.
        actual: usize,
    },
    /// A value could not be coerced to the type an operator needs.
    #[error("cannot coerce value for operator '{op}'")]
    TypeError {
        /// The operator or function requiring the coercion.
        op: String,
    },
    /// A referenced path resolved to nothing.
    #[error("path not found: {0}")]
    PathNotFound(String),
}

/// Result alias for the expression pipeline.
pub type Result<T> = std::result::Result<T, ExpressionError>;

impl From<ExpressionError> for nebula_error::Error {
    fn from(err: ExpressionError) -> Self {
        nebula_error::Error::template(err.to_string())
    }
}
