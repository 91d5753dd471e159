// Typed per-instance business data

//! # Variable Model
//!
//! Free-form business data scoped to one instance, typed over a closed set
//! of kinds. The payload enum and the kind enum are separate so callers can
//! talk about "a DATE variable" without holding a value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of variable types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableKind {
    String,
    Number,
    Boolean,
    Date,
    Json,
}

/// A typed variable payload.
///
/// Serialized as a tagged union so external consumers see the kind
/// alongside the value:
/// `{"type": "NUMBER", "value": 42.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Json(serde_json::Value),
}

impl VariableValue {
    /// The kind tag for this payload. Exhaustive by construction.
    pub fn kind(&self) -> VariableKind {
        match self {
            VariableValue::String(_) => VariableKind::String,
            VariableValue::Number(_) => VariableKind::Number,
            VariableValue::Boolean(_) => VariableKind::Boolean,
            VariableValue::Date(_) => VariableKind::Date,
            VariableValue::Json(_) => VariableKind::Json,
        }
    }

    /// The boolean payload, if this is a BOOLEAN variable.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariableValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::String(s.to_string())
    }
}

impl From<f64> for VariableValue {
    fn from(n: f64) -> Self {
        VariableValue::Number(n)
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        VariableValue::Boolean(b)
    }
}

impl From<serde_json::Value> for VariableValue {
    fn from(v: serde_json::Value) -> Self {
        VariableValue::Json(v)
    }
}

/// A named, typed value scoped to one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: VariableValue,
}

impl Variable {
    pub fn new<N: Into<String>, V: Into<VariableValue>>(name: N, value: V) -> Self {
        Variable {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_payload() {
        assert_eq!(VariableValue::from("x").kind(), VariableKind::String);
        assert_eq!(VariableValue::from(1.5).kind(), VariableKind::Number);
        assert_eq!(VariableValue::from(true).kind(), VariableKind::Boolean);
        assert_eq!(
            VariableValue::Date(Utc::now()).kind(),
            VariableKind::Date
        );
        assert_eq!(
            VariableValue::from(serde_json::json!({"a": 1})).kind(),
            VariableKind::Json
        );
    }

    #[test]
    fn tagged_wire_form() {
        let v = Variable::new("priority", 7.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["value"]["type"], "NUMBER");
        assert_eq!(json["value"]["value"], 7.0);
    }

    #[test]
    fn as_bool_only_for_booleans() {
        assert_eq!(VariableValue::from(true).as_bool(), Some(true));
        assert_eq!(VariableValue::from("true").as_bool(), None);
    }
}
