use thiserror::Error;

use crate::interpreter::RuntimeError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// Any failure of [`crate::compile`]; there is no partial output.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("Failed to render JSON output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CompileError {
    /// The error category: `LexError`, `ParseError`, `UnsupportedConstruct`,
    /// `UnboundVariable`, `UnresolvedPath`, `TypeError`, `DivisionByZero`, ...
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "LexError",
            CompileError::Parse(ParseError::UnsupportedConstruct { .. }) => "UnsupportedConstruct",
            CompileError::Parse(_) => "ParseError",
            CompileError::Runtime(error) => error.kind(),
            CompileError::Render(_) => "RenderError",
        }
    }

    /// Byte offset into the source, for errors raised before evaluation.
    pub fn position(&self) -> Option<usize> {
        match self {
            CompileError::Lex(error) => Some(error.position()),
            CompileError::Parse(error) => Some(error.position()),
            CompileError::Runtime(_) | CompileError::Render(_) => None,
        }
    }
}
