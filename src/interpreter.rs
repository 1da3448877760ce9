use serde_json::{Map, Value as JsonValue};

use crate::ast::{Node, Pair};

mod environment;
mod error;
mod runtime;
mod value;

use environment::Environment;
pub use error::RuntimeError;
use runtime::Runtime;
use value::Value;

/// Tree-walking evaluator that turns a parsed document into a JSON value.
///
/// Objects, arrays and literals are built structurally. Any other value is
/// handed to the expression runtime. Only a callable block that is the value of
/// a member sees `this`, bound to the members already built before it.
pub struct Interpreter {
    environment: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    pub fn build(&mut self, document: &Node) -> Result<JsonValue, RuntimeError> {
        let result = build_node(document, &mut self.environment, None, Scope::Root);
        self.environment.clear();
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a structural walk started.
///
/// Values evaluated directly under the document root start with an empty
/// environment; values nested inside a running block keep its bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Root,
    Nested,
}

fn build_node(
    node: &Node,
    environment: &mut Environment,
    this: Option<&Map<String, JsonValue>>,
    scope: Scope,
) -> Result<JsonValue, RuntimeError> {
    match node {
        Node::Object(pairs) => build_object(pairs, environment, scope),
        Node::Array(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                items.push(build_node(element, environment, None, scope)?);
            }
            Ok(JsonValue::Array(items))
        }
        Node::String(text) => Ok(JsonValue::String(text.clone())),
        Node::Integer(value) => Ok(JsonValue::from(*value)),
        Node::Boolean(value) => Ok(JsonValue::Bool(*value)),
        Node::Null => Ok(JsonValue::Null),
        Node::Block(statements) => {
            if scope == Scope::Root {
                environment.clear();
            }
            Runtime::new(environment, this)
                .call_block(statements)?
                .into_json()
        }
        expression => {
            if scope == Scope::Root {
                environment.clear();
            }
            Runtime::new(environment, None)
                .evaluate(expression)?
                .into_json()
        }
    }
}

/// Builds members in source order; a repeated name replaces the earlier value
/// but keeps its original position.
fn build_object(
    pairs: &[Pair],
    environment: &mut Environment,
    scope: Scope,
) -> Result<JsonValue, RuntimeError> {
    let mut members = Map::new();
    for pair in pairs {
        let value = build_node(&pair.value, environment, Some(&members), scope)?;
        members.insert(pair.name.clone(), value);
    }
    Ok(JsonValue::Object(members))
}
