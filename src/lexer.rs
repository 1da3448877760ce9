use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

/// Largest integer literal: the magnitude of `i64::MIN`.
pub const MAX_INTEGER_MAGNITUDE: u64 = 1 << 63;

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    eof_reached: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            eof_reached: false,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_whitespace();

        let (start, ch) = match self.chars.peek() {
            Some(&(idx, c)) => (idx, c),
            None => {
                self.eof_reached = true;
                let index = self.input.len();
                return Ok(Token::new(
                    TokenKind::EOF,
                    Span {
                        start: index,
                        end: index,
                    },
                ));
            }
        };

        match ch {
            ';' => Ok(self.single(TokenKind::StatementEnd, start)),
            '+' => Ok(self.single(TokenKind::Plus, start)),
            '*' => Ok(self.single(TokenKind::Star, start)),
            '/' => Ok(self.single(TokenKind::Slash, start)),
            ':' => Ok(self.single(TokenKind::Colon, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '.' => Ok(self.single(TokenKind::Dot, start)),
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            '{' => Ok(self.single(TokenKind::LBrace, start)),
            '}' => Ok(self.single(TokenKind::RBrace, start)),
            '-' => Ok(self.either('>', TokenKind::Arrow, TokenKind::Minus, start)),
            '=' => Ok(self.either('=', TokenKind::Equal, TokenKind::Assign, start)),
            '<' => Ok(self.either('=', TokenKind::LessEqual, TokenKind::Less, start)),
            '>' => Ok(self.either('=', TokenKind::GreaterEqual, TokenKind::Greater, start)),
            '!' => {
                self.advance_char();
                if self.next_is('=') {
                    self.advance_char();
                    Ok(Token::new(
                        TokenKind::NotEqual,
                        Span {
                            start,
                            end: start + 2,
                        },
                    ))
                } else {
                    Err(LexError::ExpectedEqualsAfterBang { position: start })
                }
            }
            '"' => self.read_string(start),
            c if c.is_ascii_alphabetic() => Ok(self.read_identifier(start)),
            c if c.is_ascii_digit() => self.read_number(start),
            character => Err(LexError::UnexpectedCharacter {
                character,
                position: start,
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        self.advance_char();
        Token::new(
            kind,
            Span {
                start,
                end: start + 1,
            },
        )
    }

    /// Lexes a one- or two-character operator depending on whether `second` follows.
    fn either(
        &mut self,
        second: char,
        double: TokenKind<'a>,
        single: TokenKind<'a>,
        start: usize,
    ) -> Token<'a> {
        self.advance_char();
        if self.next_is(second) {
            self.advance_char();
            Token::new(
                double,
                Span {
                    start,
                    end: start + 2,
                },
            )
        } else {
            Token::new(
                single,
                Span {
                    start,
                    end: start + 1,
                },
            )
        }
    }

    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        self.advance_char(); // Consume first letter
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let end = self.current_index();
        let ident = &self.input[start..end];
        let kind = TokenKind::keyword(ident).unwrap_or(TokenKind::Identifier(ident));
        Token::new(kind, Span { start, end })
    }

    /// Reads digits with at most one `.` and an optional JSON exponent; a second
    /// `.` ends the literal and is lexed on its own.
    fn read_number(&mut self, start: usize) -> LexResult<Token<'a>> {
        let mut is_float = false;
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else if c == '.' && !is_float {
                is_float = true;
                self.advance_char();
            } else {
                break;
            }
        }
        if matches!(self.chars.peek(), Some(&(_, 'e' | 'E'))) {
            is_float = true;
            self.read_exponent(start)?;
        }

        let end = self.current_index();
        let literal = &self.input[start..end];
        let kind = if is_float {
            let value = literal
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| LexError::InvalidFloatLiteral {
                    literal: literal.to_string(),
                    position: start,
                })?;
            TokenKind::Float(value)
        } else {
            let value = literal
                .parse::<u64>()
                .ok()
                .filter(|value| *value <= MAX_INTEGER_MAGNITUDE)
                .ok_or_else(|| LexError::InvalidIntegerLiteral {
                    literal: literal.to_string(),
                    position: start,
                })?;
            TokenKind::Integer(value)
        };
        Ok(Token::new(kind, Span { start, end }))
    }

    /// Consumes `e`/`E`, an optional sign and at least one digit.
    fn read_exponent(&mut self, start: usize) -> LexResult<()> {
        self.advance_char();
        if matches!(self.chars.peek(), Some(&(_, '+' | '-'))) {
            self.advance_char();
        }
        let mut digits = 0;
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
            self.advance_char();
            digits += 1;
        }
        if digits == 0 {
            let end = self.current_index();
            return Err(LexError::InvalidFloatLiteral {
                literal: self.input[start..end].to_string(),
                position: start,
            });
        }
        Ok(())
    }

    fn read_string(&mut self, start: usize) -> LexResult<Token<'a>> {
        self.advance_char(); // Consume opening quote
        let content_start = start + 1;
        while let Some((idx, c)) = self.advance_char() {
            match c {
                '"' => {
                    return Ok(Token::new(
                        TokenKind::String(&self.input[content_start..idx]),
                        Span {
                            start,
                            end: idx + 1,
                        },
                    ));
                }
                '\\' => self.check_escape(idx)?,
                _ => {}
            }
        }
        Err(LexError::UnterminatedString { position: start })
    }

    fn check_escape(&mut self, backslash: usize) -> LexResult<()> {
        let invalid = LexError::InvalidEscape {
            position: backslash,
        };
        match self.advance_char() {
            Some((_, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => Ok(()),
            Some((_, 'u')) => {
                for _ in 0..4 {
                    match self.advance_char() {
                        Some((_, c)) if c.is_ascii_hexdigit() => {}
                        _ => return Err(invalid),
                    }
                }
                Ok(())
            }
            Some(_) => Err(invalid),
            None => Err(LexError::UnterminatedString {
                position: backslash,
            }),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_reached {
            return None;
        }
        Some(self.next_token())
    }
}

impl<'a> Lexer<'a> {
    fn advance_char(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn next_is(&mut self, expected: char) -> bool {
        matches!(self.chars.peek(), Some(&(_, c)) if c == expected)
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

/// Decodes the escape sequences of a raw string literal body.
///
/// The lexer has already validated every escape, so malformed input only
/// reaches this through hand-built tokens; such sequences are kept verbatim.
pub fn decode_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => decoded.push('"'),
            Some('\\') => decoded.push('\\'),
            Some('/') => decoded.push('/'),
            Some('b') => decoded.push('\u{8}'),
            Some('f') => decoded.push('\u{c}'),
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('t') => decoded.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) => decoded.push(ch),
                    // Lone surrogate halves have no scalar value.
                    None => decoded.push(char::REPLACEMENT_CHARACTER),
                }
            }
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }
    decoded
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::EOF);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}
