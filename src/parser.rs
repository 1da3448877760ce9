use crate::ast::{Accessor, BinaryOperator, Node, Pair, UnaryOperator};
use crate::lexer::{MAX_INTEGER_MAGNITUDE, decode_string};
use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{ParseError, ParseResult};

/// Recursive-descent parser over a fully scanned token stream.
///
/// Each literal kind has its own rule that consumes exactly its closing
/// delimiter. Nested literals, blocks, groups and negations are counted
/// against [`MAX_DEPTH`] so hostile input fails instead of exhausting the stack.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    depth: usize,
}

pub const MAX_DEPTH: usize = 128;

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if !matches!(tokens.last().map(|token| token.kind), Some(TokenKind::EOF)) {
            let end = tokens.last().map(|token| token.span.end).unwrap_or(0);
            tokens.push(Token::new(
                TokenKind::EOF,
                Span { start: end, end },
            ));
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    pub fn parse_document(mut self) -> ParseResult<Node> {
        let root = match self.current() {
            TokenKind::LBrace => self.parse_object()?,
            TokenKind::LBracket => self.parse_array()?,
            _ => return Err(self.error("'{' or '['")),
        };
        if !matches!(self.current(), TokenKind::EOF) {
            return Err(ParseError::TrailingInput {
                found: self.current().describe(),
                position: self.current_position(),
            });
        }
        Ok(root)
    }

    fn parse_object(&mut self) -> ParseResult<Node> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut pairs = Vec::new();
        loop {
            self.skip_commas();
            match self.current() {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(Node::Object(pairs));
                }
                TokenKind::String(raw) => {
                    let name = decode_string(raw);
                    self.advance();
                    self.expect(TokenKind::Colon, "':' after member name")?;
                    let value = self.parse_value()?;
                    pairs.push(Pair { name, value });
                }
                _ => return Err(self.error("member name or '}'")),
            }
        }
    }

    fn parse_array(&mut self) -> ParseResult<Node> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut elements = Vec::new();
        loop {
            self.skip_commas();
            if matches!(self.current(), TokenKind::RBracket) {
                self.advance();
                return Ok(Node::Array(elements));
            }
            if matches!(self.current(), TokenKind::EOF) {
                return Err(self.error("']'"));
            }
            elements.push(self.parse_value()?);
        }
    }

    /// A member value or array element: a callable block or an expression.
    fn parse_value(&mut self) -> ParseResult<Node> {
        if matches!(self.current(), TokenKind::Arrow) {
            return self.descend(Self::parse_block);
        }
        self.parse_expression()
    }

    fn parse_block(&mut self) -> ParseResult<Node> {
        self.expect(TokenKind::Arrow, "'->'")?;
        self.expect(TokenKind::LBrace, "'{' after '->'")?;
        let mut statements = Vec::new();
        loop {
            while matches!(self.current(), TokenKind::StatementEnd) {
                self.advance();
            }
            if matches!(self.current(), TokenKind::RBrace) {
                self.advance();
                return Ok(Node::Block(statements));
            }
            if matches!(self.current(), TokenKind::EOF) {
                return Err(self.error("'}' closing the block"));
            }
            statements.push(self.parse_statement()?);
            if !matches!(
                self.current(),
                TokenKind::StatementEnd | TokenKind::RBrace
            ) {
                return Err(self.error("';'"));
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Node> {
        match self.current() {
            TokenKind::Var => {
                self.advance();
                let name = match self.current() {
                    TokenKind::Identifier(name) => name.to_string(),
                    _ => return Err(self.error("identifier after 'var'")),
                };
                self.advance();
                self.expect(TokenKind::Assign, "'=' after variable name")?;
                let value = self.parse_expression()?;
                Ok(Node::VarAssign {
                    name,
                    value: Box::new(value),
                })
            }
            TokenKind::Return => {
                self.advance();
                let value = self.parse_expression()?;
                if !matches!(self.current(), TokenKind::StatementEnd) {
                    return Err(self.error("';' after return value"));
                }
                Ok(Node::Return(Box::new(value)))
            }
            TokenKind::Identifier(name) if matches!(self.peek(), TokenKind::Assign) => {
                let name = name.to_string();
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                Ok(Node::VarAssign {
                    name,
                    value: Box::new(value),
                })
            }
            _ => self.parse_expression(),
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Node> {
        self.parse_binary(1)
    }

    /// Precedence climbing over `+ - * /`: multiplicative operators bind
    /// tighter, and operators of one tier associate to the left.
    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Node> {
        let mut left = self.parse_unary()?;
        while let Some(op) = binary_operator(self.current()) {
            if op.precedence() < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Node::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        if matches!(self.current(), TokenKind::Minus) {
            self.advance();
            if self.current() == TokenKind::Integer(MAX_INTEGER_MAGNITUDE) {
                self.advance();
                return Ok(Node::Integer(i64::MIN));
            }
            let operand = self.descend(Self::parse_unary)?;
            return Ok(Node::UnaryOp {
                op: UnaryOperator::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        let node = match self.current() {
            TokenKind::Integer(value) => match i64::try_from(value) {
                Ok(value) => Node::Integer(value),
                Err(_) => {
                    return Err(ParseError::IntegerOutOfRange {
                        literal: value.to_string(),
                        position: self.current_position(),
                    });
                }
            },
            TokenKind::Float(value) => Node::Float(value),
            TokenKind::String(raw) => Node::String(decode_string(raw)),
            TokenKind::True => Node::Boolean(true),
            TokenKind::False => Node::Boolean(false),
            TokenKind::Null => Node::Null,
            TokenKind::Identifier(name) => Node::VarAccess(name.to_string()),
            TokenKind::This => return self.parse_this(),
            TokenKind::LBrace => return self.descend(Self::parse_object),
            TokenKind::LBracket => return self.descend(Self::parse_array),
            TokenKind::LParen => return self.descend(Self::parse_group),
            kind if is_control_flow(kind) => {
                return Err(ParseError::UnsupportedConstruct {
                    keyword: kind.keyword_name().unwrap_or_default().to_string(),
                    position: self.current_position(),
                });
            }
            _ => return Err(self.error("expression")),
        };
        self.advance();
        Ok(node)
    }

    fn parse_group(&mut self) -> ParseResult<Node> {
        self.expect(TokenKind::LParen, "'('")?;
        let inner = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(inner)
    }

    fn parse_this(&mut self) -> ParseResult<Node> {
        self.expect(TokenKind::This, "'this'")?;
        let mut path = Vec::new();
        loop {
            match self.current() {
                TokenKind::Dot => {
                    self.advance();
                    let name = match self.current() {
                        TokenKind::Identifier(name) => name.to_string(),
                        kind => match kind.keyword_name() {
                            Some(name) => name.to_string(),
                            None => return Err(self.error("field name after '.'")),
                        },
                    };
                    self.advance();
                    path.push(Accessor::Field(name));
                }
                TokenKind::LBracket => {
                    self.advance();
                    let accessor = match self.current() {
                        TokenKind::Integer(index) => Accessor::Index(index),
                        TokenKind::String(raw) => Accessor::Field(decode_string(raw)),
                        _ => return Err(self.error("index inside '[ ]'")),
                    };
                    self.advance();
                    self.expect(TokenKind::RBracket, "']'")?;
                    path.push(accessor);
                }
                TokenKind::Identifier(_)
                | TokenKind::Integer(_)
                | TokenKind::Float(_)
                | TokenKind::This => return Err(self.error("'.' or '[' after 'this'")),
                _ => return Ok(Node::This(path)),
            }
        }
    }

    fn descend<T>(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_DEPTH,
                position: self.current_position(),
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn skip_commas(&mut self) {
        while matches!(self.current(), TokenKind::Comma) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind<'static>, expected: &str) -> ParseResult<()> {
        if self.current() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn current(&self) -> TokenKind<'a> {
        self.tokens[self.position].kind
    }

    fn current_position(&self) -> usize {
        self.tokens[self.position].span.start
    }

    fn peek(&self) -> TokenKind<'a> {
        let index = (self.position + 1).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        let position = self.current_position();
        match self.current() {
            TokenKind::EOF => ParseError::UnexpectedEnd {
                expected: expected.to_string(),
                position,
            },
            found => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.describe(),
                position,
            },
        }
    }
}

fn binary_operator(kind: TokenKind<'_>) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Plus => Some(BinaryOperator::Add),
        TokenKind::Minus => Some(BinaryOperator::Sub),
        TokenKind::Star => Some(BinaryOperator::Mul),
        TokenKind::Slash => Some(BinaryOperator::Div),
        _ => None,
    }
}

fn is_control_flow(kind: TokenKind<'_>) -> bool {
    matches!(
        kind,
        TokenKind::If
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::For
            | TokenKind::In
            | TokenKind::Step
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Parent
    )
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> ParseResult<Node> {
    Parser::new(tokens).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use indoc::indoc;

    fn parse(input: &str) -> ParseResult<Node> {
        parse_tokens(tokenize(input).expect("tokenize failed"))
    }

    fn int(value: i64) -> Node {
        Node::Integer(value)
    }

    fn binary(left: Node, op: BinaryOperator, right: Node) -> Node {
        Node::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn pair(name: &str, value: Node) -> Pair {
        Pair {
            name: name.to_string(),
            value,
        }
    }

    fn member_value(document: Node) -> Node {
        match document {
            Node::Object(mut pairs) => pairs.remove(0).value,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn parses_simple_template() {
        let input = indoc! {r#"
            {
                "a": 1,
                "b": -> { var x = this.a * 2; return x; }
            }
        "#};
        let document = parse(input).expect("parse failed");

        let expected = Node::Object(vec![
            pair("a", int(1)),
            pair(
                "b",
                Node::Block(vec![
                    Node::VarAssign {
                        name: "x".to_string(),
                        value: Box::new(binary(
                            Node::This(vec![Accessor::Field("a".to_string())]),
                            BinaryOperator::Mul,
                            int(2),
                        )),
                    },
                    Node::Return(Box::new(Node::VarAccess("x".to_string()))),
                ]),
            ),
        ]);

        assert_eq!(document, expected);
    }

    #[test]
    fn parses_nested_literals_and_optional_commas() {
        let document = parse(r#"[ {"a": [1, [2]] "b": {}}, "s", true, null ]"#)
            .expect("parse failed");
        let expected = Node::Array(vec![
            Node::Object(vec![
                pair("a", Node::Array(vec![int(1), Node::Array(vec![int(2)])])),
                pair("b", Node::Object(vec![])),
            ]),
            Node::String("s".to_string()),
            Node::Boolean(true),
            Node::Null,
        ]);
        assert_eq!(document, expected);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let value = member_value(parse(r#"{"a": 2 + 3 * 4 - 1}"#).expect("parse failed"));
        let expected = binary(
            binary(int(2), BinaryOperator::Add, binary(int(3), BinaryOperator::Mul, int(4))),
            BinaryOperator::Sub,
            int(1),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn operators_in_one_tier_associate_left() {
        let value = member_value(parse(r#"{"a": 8 / 4 / 2}"#).expect("parse failed"));
        let expected = binary(
            binary(int(8), BinaryOperator::Div, int(4)),
            BinaryOperator::Div,
            int(2),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn parses_unary_minus_and_parentheses() {
        let value = member_value(parse(r#"{"a": -(1 + 2) * 3}"#).expect("parse failed"));
        let expected = binary(
            Node::UnaryOp {
                op: UnaryOperator::Neg,
                operand: Box::new(binary(int(1), BinaryOperator::Add, int(2))),
            },
            BinaryOperator::Mul,
            int(3),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn parses_this_accessor_chain() {
        let value = member_value(
            parse(r#"{"a": -> { return this.items[1].name; }}"#).expect("parse failed"),
        );
        let expected = Node::Block(vec![Node::Return(Box::new(Node::This(vec![
            Accessor::Field("items".to_string()),
            Accessor::Index(1),
            Accessor::Field("name".to_string()),
        ])))]);
        assert_eq!(value, expected);
    }

    #[test]
    fn bare_this_is_the_whole_object() {
        let value =
            member_value(parse(r#"{"a": -> { return this; }}"#).expect("parse failed"));
        assert_eq!(
            value,
            Node::Block(vec![Node::Return(Box::new(Node::This(vec![])))])
        );
    }

    #[test]
    fn parses_assignment_without_var() {
        let value = member_value(
            parse(r#"{"a": -> { var n = 1; n = n + 1; n }}"#).expect("parse failed"),
        );
        let expected = Node::Block(vec![
            Node::VarAssign {
                name: "n".to_string(),
                value: Box::new(int(1)),
            },
            Node::VarAssign {
                name: "n".to_string(),
                value: Box::new(binary(
                    Node::VarAccess("n".to_string()),
                    BinaryOperator::Add,
                    int(1),
                )),
            },
            Node::VarAccess("n".to_string()),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn decodes_escaped_member_names() {
        let document = parse(r#"{"say \"hi\"": "a\tb"}"#).expect("parse failed");
        assert_eq!(
            document,
            Node::Object(vec![pair("say \"hi\"", Node::String("a\tb".to_string()))])
        );
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = parse(r#"{ "a": 1"#).expect_err("expected parse failure");
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
    }

    #[test]
    fn rejects_empty_input() {
        let err = parse("").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::UnexpectedEnd {
                expected: "'{' or '['".to_string(),
                position: 0
            }
        );
    }

    #[test]
    fn rejects_scalar_root() {
        let err = parse("42").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::UnexpectedToken { position: 0, .. }));
    }

    #[test]
    fn rejects_trailing_input() {
        let err = parse("{} []").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::TrailingInput { position: 3, .. }));
    }

    #[test]
    fn requires_identifier_after_var() {
        let err = parse(r#"{"a": -> { var 1 = 2; }}"#).expect_err("expected parse failure");
        assert!(err.to_string().contains("identifier after 'var'"));
    }

    #[test]
    fn requires_assign_after_var_target() {
        let err = parse(r#"{"a": -> { var x 2; }}"#).expect_err("expected parse failure");
        assert!(err.to_string().contains("'=' after variable name"));
    }

    #[test]
    fn requires_statement_end_after_return() {
        let err = parse(r#"{"a": -> { return 1 }}"#).expect_err("expected parse failure");
        assert!(err.to_string().contains("';' after return value"));
    }

    #[test]
    fn requires_brace_after_arrow() {
        let err = parse(r#"{"a": -> return 1;}"#).expect_err("expected parse failure");
        assert!(err.to_string().contains("'{' after '->'"));
    }

    #[test]
    fn requires_accessor_after_this() {
        let err = parse(r#"{"a": -> { return this a; }}"#).expect_err("expected parse failure");
        assert!(err.to_string().contains("'.' or '[' after 'this'"));
    }

    #[test]
    fn requires_closing_bracket_in_accessor() {
        let err = parse(r#"{"a": -> { return this[0; }}"#).expect_err("expected parse failure");
        assert!(err.to_string().contains("Expected ']'"));
    }

    #[test]
    fn folds_negated_minimum_integer() {
        let document = parse("[-9223372036854775808, - 9223372036854775808]").expect("parse failed");
        assert_eq!(
            document,
            Node::Array(vec![Node::Integer(i64::MIN), Node::Integer(i64::MIN)])
        );
    }

    #[test]
    fn rejects_unnegated_minimum_magnitude() {
        let err = parse("[9223372036854775808]").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::IntegerOutOfRange {
                literal: "9223372036854775808".to_string(),
                position: 1
            }
        );
        let err = parse("[1 - 9223372036854775808]").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::IntegerOutOfRange { position: 5, .. }));
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        let source = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(parse(&source).is_ok());
    }

    #[test]
    fn rejects_nesting_past_the_limit() {
        let source = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));
        let err = parse(&source).expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::NestingTooDeep {
                limit: MAX_DEPTH,
                position: MAX_DEPTH + 1
            }
        );

        for source in [
            format!("{{\"a\": {}1{}}}", "(".repeat(200), ")".repeat(200)),
            format!("{{\"a\": {}1}}", "-".repeat(200)),
            format!("{}1{}", "{\"a\": ".repeat(200), "}".repeat(200)),
            format!("{}{}", "[".repeat(200_000), "]".repeat(200_000)),
        ] {
            let err = parse(&source).expect_err("expected parse failure");
            assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{err:?}");
        }
    }

    #[test]
    fn rejects_control_flow_keywords() {
        for keyword in ["if", "while", "for", "break", "continue", "else", "elif"] {
            let source = format!(r#"{{"a": -> {{ {keyword} }}}}"#);
            let err = parse(&source).expect_err("expected parse failure");
            assert!(
                matches!(&err, ParseError::UnsupportedConstruct { keyword: found, .. } if found == keyword),
                "unexpected error for {keyword}: {err:?}"
            );
        }
    }
}
