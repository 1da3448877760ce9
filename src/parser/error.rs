use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected {expected}, got {found} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("Expected {expected}, got end of input at position {position}")]
    UnexpectedEnd { expected: String, position: usize },
    #[error("'{keyword}' is not supported at position {position}")]
    UnsupportedConstruct { keyword: String, position: usize },
    #[error("Unexpected {found} after the document at position {position}")]
    TrailingInput { found: String, position: usize },
    #[error("Integer literal {literal} is out of range at position {position}")]
    IntegerOutOfRange { literal: String, position: usize },
    #[error("Nesting deeper than {limit} levels at position {position}")]
    NestingTooDeep { limit: usize, position: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEnd { position, .. }
            | ParseError::UnsupportedConstruct { position, .. }
            | ParseError::TrailingInput { position, .. }
            | ParseError::IntegerOutOfRange { position, .. }
            | ParseError::NestingTooDeep { position, .. } => *position,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
