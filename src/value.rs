use std::fmt;

use serde::{Serialize, Serializer};

/// Scalar value carried by a request payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Self::Integer(value)
    }

    pub fn float(value: f64) -> Self {
        Self::Float(value)
    }

    pub fn bool(value: bool) -> Self {
        Self::Bool(value)
    }

    /// Returns `true` for values that must never reach the wire.
    ///
    /// Only empty text qualifies; numeric zero and `false` are real values.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(value) => serializer.serialize_str(value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::Bool(value) => serializer.serialize_bool(*value),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn helper_constructors() {
        assert_eq!(Value::text("abc"), Value::Text("abc".to_owned()));
        assert_eq!(Value::integer(7), Value::Integer(7));
        assert_eq!(Value::float(1.25), Value::Float(1.25));
        assert_eq!(Value::bool(true), Value::Bool(true));
    }

    #[test]
    fn display_matches_query_representation() {
        assert_eq!(Value::integer(42).to_string(), "42");
        assert_eq!(Value::bool(false).to_string(), "false");
        assert_eq!(Value::text("a b").to_string(), "a b");
    }

    #[test]
    fn serializes_as_json_scalars() {
        let encoded = serde_json::to_string(&vec![
            Value::text("x"),
            Value::integer(3),
            Value::bool(true),
        ])
        .expect("must serialize");
        assert_eq!(encoded, r#"["x",3,true]"#);
    }

    #[test]
    fn only_empty_text_is_empty() {
        assert!(Value::text("").is_empty());
        assert!(!Value::integer(0).is_empty());
        assert!(!Value::bool(false).is_empty());
    }
}
