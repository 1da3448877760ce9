use serde_json::{Number, Value as JsonValue};

use super::RuntimeError;

/// Result of evaluating an expression.
///
/// Arrays and objects (from `this` or nested literals) stay as JSON fragments;
/// scalars are unpacked so the arithmetic coercions can inspect them.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Null,
    Json(JsonValue),
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Integer(value) => value as f64,
            Numeric::Float(value) => value,
        }
    }
}

impl Value {
    pub(super) fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(value) => Value::Boolean(value),
            JsonValue::String(text) => Value::Text(text),
            JsonValue::Number(number) => match number.as_i64() {
                Some(value) => Value::Integer(value),
                None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            other @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Json(other),
        }
    }

    pub(super) fn into_json(self) -> Result<JsonValue, RuntimeError> {
        match self {
            Value::Integer(value) => Ok(JsonValue::from(value)),
            Value::Float(value) => Number::from_f64(value)
                .map(JsonValue::Number)
                .ok_or(RuntimeError::NonFiniteNumber),
            Value::Text(text) => Ok(JsonValue::String(text)),
            Value::Boolean(value) => Ok(JsonValue::Bool(value)),
            Value::Null => Ok(JsonValue::Null),
            Value::Json(json) => Ok(json),
        }
    }

    /// Text used when the value takes part in string concatenation.
    pub(super) fn to_text(&self) -> String {
        match self {
            Value::Integer(value) => value.to_string(),
            Value::Float(value) => match Number::from_f64(*value) {
                Some(number) => number.to_string(),
                None => value.to_string(),
            },
            Value::Text(text) => text.clone(),
            Value::Boolean(value) => value.to_string(),
            Value::Null => "null".to_string(),
            Value::Json(json) => json.to_string(),
        }
    }

    pub(super) fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Text(text) => !text.is_empty(),
            Value::Boolean(value) => *value,
            Value::Null => false,
            Value::Json(JsonValue::Array(items)) => !items.is_empty(),
            Value::Json(JsonValue::Object(map)) => !map.is_empty(),
            Value::Json(other) => Value::from_json(other.clone()).is_truthy(),
        }
    }

    pub(super) fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Json(JsonValue::Array(_)) => "array",
            Value::Json(JsonValue::Object(_)) => "object",
            Value::Json(_) => "json",
        }
    }

    pub(super) fn as_integer(&self, operation: &str) -> Result<i64, RuntimeError> {
        match self {
            Value::Integer(value) => Ok(*value),
            other => Err(RuntimeError::UnaryTypeError {
                operation: operation.to_string(),
                operand: other.type_name().to_string(),
            }),
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            Value::Integer(value) => Some(Numeric::Integer(*value)),
            Value::Float(value) => Some(Numeric::Float(*value)),
            _ => None,
        }
    }

    /// Integer view used by `+` and `*` when a string is involved. Floats
    /// truncate toward zero; strings must spell an integer.
    fn coerce_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Float(value) if (i64::MIN as f64..i64::MAX as f64).contains(value) => {
                Some(value.trunc() as i64)
            }
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// Numeric addition; with a string operand, integer addition when both
    /// sides read as integers, otherwise concatenation.
    pub(super) fn add(&self, other: &Value) -> Result<Value, RuntimeError> {
        if let (Some(left), Some(right)) = (self.numeric(), other.numeric()) {
            return arithmetic("+", left, right, i64::checked_add, |l, r| l + r);
        }
        if self.is_text() || other.is_text() {
            if let (Some(left), Some(right)) = (self.coerce_integer(), other.coerce_integer()) {
                return checked("+", left.checked_add(right));
            }
            let mut text = self.to_text();
            text.push_str(&other.to_text());
            return Ok(Value::Text(text));
        }
        Err(type_error("+", self, other))
    }

    pub(super) fn sub(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self.numeric(), other.numeric()) {
            (Some(left), Some(right)) => {
                arithmetic("-", left, right, i64::checked_sub, |l, r| l - r)
            }
            _ => Err(type_error("-", self, other)),
        }
    }

    /// Numeric multiplication; a string operand must read as an integer.
    pub(super) fn mul(&self, other: &Value) -> Result<Value, RuntimeError> {
        if self.is_text() || other.is_text() {
            return match (self.coerce_integer(), other.coerce_integer()) {
                (Some(left), Some(right)) => checked("*", left.checked_mul(right)),
                _ => Err(type_error("*", self, other)),
            };
        }
        match (self.numeric(), other.numeric()) {
            (Some(left), Some(right)) => {
                arithmetic("*", left, right, i64::checked_mul, |l, r| l * r)
            }
            _ => Err(type_error("*", self, other)),
        }
    }

    /// Division; integer operands give an integer only when the division is exact.
    pub(super) fn div(&self, other: &Value) -> Result<Value, RuntimeError> {
        match other {
            Value::Integer(0) => return Err(RuntimeError::DivisionByZero),
            Value::Float(value) if *value == 0.0 => return Err(RuntimeError::DivisionByZero),
            _ => {}
        }
        match (self.numeric(), other.numeric()) {
            (Some(Numeric::Integer(left)), Some(Numeric::Integer(right))) => {
                match left.checked_rem(right) {
                    Some(0) => checked("/", left.checked_div(right)),
                    Some(_) => float(left as f64 / right as f64),
                    None => Err(overflow("/")),
                }
            }
            (Some(left), Some(right)) => float(left.as_f64() / right.as_f64()),
            _ => Err(type_error("/", self, other)),
        }
    }

    pub(super) fn neg(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Integer(value) => checked("-", value.checked_neg()),
            Value::Float(value) => Ok(Value::Float(-value)),
            other => Err(RuntimeError::UnaryTypeError {
                operation: "-".to_string(),
                operand: other.type_name().to_string(),
            }),
        }
    }
}

fn arithmetic(
    operation: &str,
    left: Numeric,
    right: Numeric,
    integer_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Numeric::Integer(left), Numeric::Integer(right)) => {
            checked(operation, integer_op(left, right))
        }
        (left, right) => float(float_op(left.as_f64(), right.as_f64())),
    }
}

fn checked(operation: &str, result: Option<i64>) -> Result<Value, RuntimeError> {
    result.map(Value::Integer).ok_or_else(|| overflow(operation))
}

fn float(value: f64) -> Result<Value, RuntimeError> {
    if value.is_finite() {
        Ok(Value::Float(value))
    } else {
        Err(RuntimeError::NonFiniteNumber)
    }
}

fn overflow(operation: &str) -> RuntimeError {
    RuntimeError::IntegerOverflow {
        operation: operation.to_string(),
    }
}

fn type_error(operation: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeError {
        operation: operation.to_string(),
        left: left.type_name().to_string(),
        right: right.type_name().to_string(),
    }
}
