use std::cmp::Ordering;
use std::fmt::Display;

use kvql::ast::Literal;
use serde::{Deserialize, Serialize};

/// A dynamically typed cell value as the store holds it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    /// Converts a parsed literal. `NULL` has no value form and yields `None`.
    pub fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::String(s) => Some(Value::String(s.clone())),
            Literal::Integer(i) => Some(Value::Integer(*i)),
            Literal::Float(f) => Some(Value::Float(*f)),
            Literal::Boolean(b) => Some(Value::Boolean(*b)),
            Literal::Null => None,
        }
    }

    /// Partial order across values.
    ///
    /// Integers and floats compare numerically. A string compared with a number is parsed as a number first;
    /// if that fails the pair is unordered. Booleans only compare with booleans.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(s), other) => s.parse::<f64>().ok().and_then(|n| n.partial_cmp(&other.as_f64()?)),
            (this, Value::String(s)) => this.as_f64()?.partial_cmp(&s.parse::<f64>().ok()?),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Integer(i) }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Integer(i as i64) }
}
impl From<f64> for Value {
    fn from(f: f64) -> Self { Value::Float(f) }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Boolean(b) }
}
