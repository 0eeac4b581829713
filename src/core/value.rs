//! Parameter values passed through the uniform node surface.
//!
//! The presentation layer (and the CLI) mutates node parameters through
//! `set_parameter(name, Value)` without knowing the concrete node type.
//! A closed enum keeps the set of parameter types finite and lets each
//! node match exhaustively on what it accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// UTF-8 text (mode names, file paths).
    Text(String),
}

impl Value {
    /// Try to read this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to read this value as a float.
    /// Integers are widened to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to read this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to read this value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{:.4}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::Integer(3).as_float(), Some(3.0)); // widening
        assert_eq!(Value::Float(2.5).as_integer(), None); // no downcast
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Text("otsu".to_string()).as_text(), Some("otsu"));
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(7i64), Value::Integer(7));
        assert_eq!(Value::from(0.5f64), Value::Float(0.5));
        assert_eq!(Value::from(false), Value::Boolean(false));
        assert_eq!(Value::from("binary"), Value::Text("binary".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Text("a".to_string()).to_string(), "\"a\"");
    }
}
