#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'a> {
    Identifier(&'a str),
    /// Magnitude only; a leading `-` is its own token, so `2^63` is allowed here
    /// and range-checked by the parser.
    Integer(u64),
    Float(f64),
    /// Raw text between the quotes; escapes are validated but not yet decoded.
    String(&'a str),

    // Keywords
    Var,
    If,
    Else,
    Elif,
    Parent,
    For,
    In,
    Step,
    While,
    Return,
    Break,
    Continue,
    This,
    True,
    False,
    Null,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Arrow,        // ->
    Assign,       // =
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // Delimiters
    Colon,    // :
    Comma,    // ,
    Dot,      // .
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Structural
    StatementEnd, // ;
    EOF,
}

const KEYWORDS: [(&str, TokenKind<'static>); 16] = [
    ("var", TokenKind::Var),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("elif", TokenKind::Elif),
    ("parent", TokenKind::Parent),
    ("for", TokenKind::For),
    ("in", TokenKind::In),
    ("step", TokenKind::Step),
    ("while", TokenKind::While),
    ("return", TokenKind::Return),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("this", TokenKind::This),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
];

impl<'a> TokenKind<'a> {
    pub fn keyword(ident: &str) -> Option<TokenKind<'static>> {
        KEYWORDS
            .iter()
            .find(|(name, _)| *name == ident)
            .map(|(_, kind)| *kind)
    }

    pub fn keyword_name(&self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
    }

    /// Short human-readable form used in parse error messages.
    pub fn describe(&self) -> String {
        if let Some(name) = self.keyword_name() {
            return format!("'{name}'");
        }
        let symbol = match self {
            TokenKind::Identifier(name) => return format!("identifier '{name}'"),
            TokenKind::Integer(value) => return format!("integer {value}"),
            TokenKind::Float(value) => return format!("float {value}"),
            TokenKind::String(text) => return format!("string \"{text}\""),
            TokenKind::EOF => return "end of input".to_string(),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Arrow => "->",
            TokenKind::Assign => "=",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::StatementEnd => ";",
            _ => "keyword",
        };
        format!("'{symbol}'")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }
}
