//! Loosely typed action response values.

use std::collections::BTreeMap;
use std::fmt;

/// Named fields returned by one remote action, e.g. `NewSerialNumber`.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single response field as delivered by the transport.
///
/// The SOAP adapter only produces `Text` and `Null`; other callers may
/// hand over already typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s:?}"),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_text() {
        assert_eq!(FieldValue::from("Up").to_string(), "\"Up\"");
        assert_eq!(FieldValue::from(42).to_string(), "42");
        assert_eq!(FieldValue::Null.to_string(), "null");
    }

    #[test]
    fn as_text_only_for_text() {
        assert_eq!(FieldValue::from("x").as_text(), Some("x"));
        assert_eq!(FieldValue::from(true).as_text(), None);
        assert!(FieldValue::Null.is_null());
    }
}
