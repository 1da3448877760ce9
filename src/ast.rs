//! Syntax tree shared by the parser and the interpreter.
//!
//! The root of every document is an [`Node::Object`] or [`Node::Array`].
//! Structural nodes (objects, arrays, pairs, literals) are turned straight into
//! JSON, everything else is evaluated to a value first.

#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Object(Vec<Pair>),
    Array(Vec<Node>),
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    VarAccess(String),
    VarAssign {
        name: String,
        value: Box<Node>,
    },
    BinaryOp {
        left: Box<Node>,
        op: BinaryOperator,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    /// `this` followed by zero or more accessors; an empty path is the whole object.
    This(Vec<Accessor>),
    Block(Vec<Node>),
    Return(Box<Node>),
    If {
        cases: Vec<IfCase>,
        else_body: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    For {
        var_name: String,
        start: Box<Node>,
        end: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    Break,
    Continue,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Pair {
    pub name: String,
    pub value: Node,
}

#[derive(Debug, PartialEq, Clone)]
pub struct IfCase {
    pub condition: Node,
    pub body: Node,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }

    /// Binding power used by the parser; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Sub => 1,
            BinaryOperator::Mul | BinaryOperator::Div => 2,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Neg,
}

/// One step of a `this` path.
#[derive(Debug, PartialEq, Clone)]
pub enum Accessor {
    Field(String),
    Index(u64),
}

impl std::fmt::Display for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accessor::Field(name) => write!(f, ".{name}"),
            Accessor::Index(index) => write!(f, "[{index}]"),
        }
    }
}
