use crate::spec::SchemaKind;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A parameter value after style decoding and type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Array(Vec<CoercedValue>),
    Object(BTreeMap<String, CoercedValue>),
}

impl CoercedValue {
    pub fn into_json(self) -> Value {
        match self {
            CoercedValue::Null => Value::Null,
            CoercedValue::String(s) => Value::String(s),
            CoercedValue::Integer(i) => Value::Number(i.into()),
            CoercedValue::Number(f) => match Number::from_f64(f) {
                Some(n) => Value::Number(n),
                // NaN and infinities have no JSON form
                None => Value::String(f.to_string()),
            },
            CoercedValue::Boolean(b) => Value::Bool(b),
            CoercedValue::Array(items) => {
                Value::Array(items.into_iter().map(CoercedValue::into_json).collect())
            }
            CoercedValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CoercedValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<CoercedValue> for Value {
    fn from(value: CoercedValue) -> Self {
        value.into_json()
    }
}

/// Coerce a raw string into the primitive `kind`.
///
/// Never fails: input that does not parse stays a string, and the schema
/// evaluator reports the type mismatch later.
pub fn coerce(raw: &str, kind: SchemaKind) -> CoercedValue {
    let fallback = || CoercedValue::String(raw.to_string());
    match kind {
        SchemaKind::Integer => raw
            .parse::<i64>()
            .map(CoercedValue::Integer)
            .unwrap_or_else(|_| fallback()),
        SchemaKind::Number => raw
            .parse::<f64>()
            .map(CoercedValue::Number)
            .unwrap_or_else(|_| fallback()),
        SchemaKind::Boolean => match raw {
            "true" => CoercedValue::Boolean(true),
            "false" => CoercedValue::Boolean(false),
            _ => fallback(),
        },
        _ => fallback(),
    }
}
