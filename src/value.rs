//! Raw values held by the device.
//!
//! The device only knows numbers, booleans and text. Display strings such as
//! `"OPEN"` or `"On"` belong to whoever publishes the values.

use std::fmt;

/// A value stored in, or written to, a device field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// The semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Bool,
    Text,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

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
            // f64's Display is the shortest string that parses back to the same value.
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Number => "a number",
            ValueKind::Bool => "a boolean",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_without_loss() {
        for n in [0.0, 1e-5, 123.45, 1e5, 0.316] {
            let shown = Value::Number(n).to_string();
            assert_eq!(shown.parse::<f64>().unwrap(), n);
        }
    }

    #[test]
    fn accessors_only_match_their_kind() {
        let v = Value::from(true);
        assert_eq!(v.kind(), ValueKind::Bool);
        assert_eq!(v.as_bool(), Some(true));
        assert_eq!(v.as_number(), None);
        assert_eq!(Value::from("x").as_text(), Some("x"));
    }
}
