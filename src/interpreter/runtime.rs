use serde_json::{Map, Value as JsonValue};

use crate::ast::{Accessor, BinaryOperator, Node, UnaryOperator};

use super::{Environment, RuntimeError, Scope, Value, build_node};

/// Control-flow marker for statement execution.
pub(super) enum ExecResult {
    Proceed,
    Return(Value),
    Break,
    Continue,
}

/// Expression-mode evaluator for one callable block invocation.
///
/// Every invocation gets its own output buffer and loop depth but shares the
/// compilation's environment, so nested blocks see the outer bindings.
pub(super) struct Runtime<'e, 't> {
    environment: &'e mut Environment,
    this: Option<&'t Map<String, JsonValue>>,
    output: Vec<Value>,
    loop_depth: usize,
}

impl<'e, 't> Runtime<'e, 't> {
    pub(super) fn new(
        environment: &'e mut Environment,
        this: Option<&'t Map<String, JsonValue>>,
    ) -> Self {
        Self {
            environment,
            this,
            output: Vec::new(),
            loop_depth: 0,
        }
    }

    /// Runs the statements of a callable block and produces its value: the
    /// returned value if a `return` runs, otherwise the collected output.
    pub(super) fn call_block(mut self, statements: &[Node]) -> Result<Value, RuntimeError> {
        for statement in statements {
            match self.execute(statement)? {
                ExecResult::Proceed => {}
                ExecResult::Return(value) => return Ok(value),
                // Loop depth is zero here, so `execute` has already rejected these.
                ExecResult::Break => return Err(RuntimeError::BreakOutsideLoop),
                ExecResult::Continue => return Err(RuntimeError::ContinueOutsideLoop),
            }
        }
        Ok(self.into_output())
    }

    fn into_output(mut self) -> Value {
        match self.output.len() {
            0 => Value::Null,
            1 => self.output.remove(0),
            _ => Value::Text(self.output.iter().map(Value::to_text).collect()),
        }
    }

    fn execute(&mut self, node: &Node) -> Result<ExecResult, RuntimeError> {
        match node {
            Node::VarAssign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.define(name.as_str(), value);
                Ok(ExecResult::Proceed)
            }
            Node::Return(value) => Ok(ExecResult::Return(self.evaluate(value)?)),
            Node::Block(statements) => self.execute_sequence(statements),
            Node::If { cases, else_body } => {
                for case in cases {
                    if self.evaluate(&case.condition)?.is_truthy() {
                        return self.execute(&case.body);
                    }
                }
                match else_body {
                    Some(body) => self.execute(body),
                    None => Ok(ExecResult::Proceed),
                }
            }
            Node::While { condition, body } => {
                self.loop_depth += 1;
                let result = self.run_while(condition, body);
                self.loop_depth -= 1;
                result
            }
            Node::For {
                var_name,
                start,
                end,
                step,
                body,
            } => {
                self.loop_depth += 1;
                let result = self.run_for(var_name, start, end, step.as_deref(), body);
                self.loop_depth -= 1;
                result
            }
            Node::Break if self.loop_depth > 0 => Ok(ExecResult::Break),
            Node::Break => Err(RuntimeError::BreakOutsideLoop),
            Node::Continue if self.loop_depth > 0 => Ok(ExecResult::Continue),
            Node::Continue => Err(RuntimeError::ContinueOutsideLoop),
            expression => {
                let value = self.evaluate(expression)?;
                self.output.push(value);
                Ok(ExecResult::Proceed)
            }
        }
    }

    fn execute_sequence(&mut self, statements: &[Node]) -> Result<ExecResult, RuntimeError> {
        for statement in statements {
            match self.execute(statement)? {
                ExecResult::Proceed => {}
                other => return Ok(other),
            }
        }
        Ok(ExecResult::Proceed)
    }

    fn run_while(&mut self, condition: &Node, body: &Node) -> Result<ExecResult, RuntimeError> {
        while self.evaluate(condition)?.is_truthy() {
            match self.execute(body)? {
                ExecResult::Proceed | ExecResult::Continue => {}
                ExecResult::Break => break,
                ExecResult::Return(value) => return Ok(ExecResult::Return(value)),
            }
        }
        Ok(ExecResult::Proceed)
    }

    /// Counts from `start` to `end` inclusive; a negative step counts down.
    fn run_for(
        &mut self,
        var_name: &str,
        start: &Node,
        end: &Node,
        step: Option<&Node>,
        body: &Node,
    ) -> Result<ExecResult, RuntimeError> {
        let mut current = self.evaluate(start)?.as_integer("for")?;
        let end = self.evaluate(end)?.as_integer("for")?;
        let step = match step {
            Some(step) => self.evaluate(step)?.as_integer("step")?,
            None => 1,
        };
        if step == 0 {
            return Err(RuntimeError::ZeroStep);
        }

        while (step > 0 && current <= end) || (step < 0 && current >= end) {
            self.environment.define(var_name, Value::Integer(current));
            match self.execute(body)? {
                ExecResult::Proceed | ExecResult::Continue => {}
                ExecResult::Break => break,
                ExecResult::Return(value) => return Ok(ExecResult::Return(value)),
            }
            match current.checked_add(step) {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(ExecResult::Proceed)
    }

    pub(super) fn evaluate(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        match node {
            Node::String(text) => Ok(Value::Text(text.clone())),
            Node::Integer(value) => Ok(Value::Integer(*value)),
            Node::Float(value) => Ok(Value::Float(*value)),
            Node::Boolean(value) => Ok(Value::Boolean(*value)),
            Node::Null => Ok(Value::Null),
            Node::Object(_) => {
                let json = build_node(node, self.environment, None, Scope::Nested)?;
                Ok(Value::from_json(json))
            }
            // Arrays open no context of their own, so elements keep the block's `this`.
            Node::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate(element)?.into_json()?);
                }
                Ok(Value::Json(JsonValue::Array(items)))
            }
            Node::VarAccess(name) => self.environment.lookup(name).cloned().ok_or_else(|| {
                RuntimeError::UnboundVariable {
                    name: name.to_string(),
                }
            }),
            Node::BinaryOp { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match op {
                    BinaryOperator::Add => left.add(&right),
                    BinaryOperator::Sub => left.sub(&right),
                    BinaryOperator::Mul => left.mul(&right),
                    BinaryOperator::Div => left.div(&right),
                }
            }
            Node::UnaryOp {
                op: UnaryOperator::Neg,
                operand,
            } => self.evaluate(operand)?.neg(),
            Node::This(path) => self.resolve_this(path),
            Node::Block(statements) => {
                Runtime::new(self.environment, self.this).call_block(statements)
            }
            // Statements in value position: assignments contribute nothing.
            Node::VarAssign { .. }
            | Node::Return(_)
            | Node::If { .. }
            | Node::While { .. }
            | Node::For { .. }
            | Node::Break
            | Node::Continue => match self.execute(node)? {
                ExecResult::Return(value) => Ok(value),
                ExecResult::Proceed | ExecResult::Break | ExecResult::Continue => Ok(Value::Null),
            },
        }
    }

    fn resolve_this(&self, path: &[Accessor]) -> Result<Value, RuntimeError> {
        let object = self.this.ok_or(RuntimeError::ThisOutsideObject)?;
        let Some((first, rest)) = path.split_first() else {
            return Ok(Value::Json(JsonValue::Object(object.clone())));
        };

        let unresolved = || RuntimeError::UnresolvedPath {
            path: path.iter().fold("this".to_string(), |mut text, accessor| {
                text.push_str(&accessor.to_string());
                text
            }),
        };
        let mut current = match first {
            Accessor::Field(name) => object.get(name),
            Accessor::Index(_) => None,
        }
        .ok_or_else(unresolved)?;

        for accessor in rest {
            current = match (accessor, current) {
                (Accessor::Field(name), JsonValue::Object(map)) => map.get(name),
                (Accessor::Index(index), JsonValue::Array(items)) => usize::try_from(*index)
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            }
            .ok_or_else(unresolved)?;
        }
        Ok(Value::from_json(current.clone()))
    }
}
