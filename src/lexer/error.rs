use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Expected '=' after '!' at position {position}")]
    ExpectedEqualsAfterBang { position: usize },
    #[error("Unterminated string literal at position {position}")]
    UnterminatedString { position: usize },
    #[error("Invalid escape sequence in string literal at position {position}")]
    InvalidEscape { position: usize },
    #[error("Invalid integer literal '{literal}' at position {position}")]
    InvalidIntegerLiteral { literal: String, position: usize },
    #[error("Invalid float literal '{literal}' at position {position}")]
    InvalidFloatLiteral { literal: String, position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::ExpectedEqualsAfterBang { position }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position }
            | LexError::InvalidIntegerLiteral { position, .. }
            | LexError::InvalidFloatLiteral { position, .. } => *position,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
