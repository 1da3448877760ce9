use thiserror::Error;

/// Typed errors produced while evaluating a template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Unbound variable '{name}'")]
    UnboundVariable { name: String },
    #[error("Path '{path}' does not exist in the object being built")]
    UnresolvedPath { path: String },
    #[error("'this' can only be used inside a callable block of an object member")]
    ThisOutsideObject,
    #[error("Unsupported operand types for '{operation}': {left} and {right}")]
    TypeError {
        operation: String,
        left: String,
        right: String,
    },
    #[error("Unsupported operand type for '{operation}': {operand}")]
    UnaryTypeError { operation: String, operand: String },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow in '{operation}'")]
    IntegerOverflow { operation: String },
    #[error("Number is not representable in JSON")]
    NonFiniteNumber,
    #[error("Loop step must not be zero")]
    ZeroStep,
    #[error("'break' outside of a loop")]
    BreakOutsideLoop,
    #[error("'continue' outside of a loop")]
    ContinueOutsideLoop,
}

impl RuntimeError {
    /// Coarse error category, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::UnboundVariable { .. } => "UnboundVariable",
            RuntimeError::UnresolvedPath { .. } | RuntimeError::ThisOutsideObject => {
                "UnresolvedPath"
            }
            RuntimeError::TypeError { .. }
            | RuntimeError::UnaryTypeError { .. }
            | RuntimeError::ZeroStep => "TypeError",
            RuntimeError::DivisionByZero => "DivisionByZero",
            RuntimeError::IntegerOverflow { .. } | RuntimeError::NonFiniteNumber => {
                "ArithmeticError"
            }
            RuntimeError::BreakOutsideLoop | RuntimeError::ContinueOutsideLoop => {
                "UnsupportedConstruct"
            }
        }
    }
}
