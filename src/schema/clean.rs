//! OpenAPI → JSON Schema 2020-12 cleaning pass.
//!
//! OpenAPI schema objects carry a handful of keywords a JSON Schema evaluator
//! either does not know or interprets differently. Cleaning rebuilds the tree
//! without mutating the input:
//!
//! - `nullable: true` becomes a `"null"` member of `type`
//! - `example`, `xml`, `externalDocs`, `readOnly`, `writeOnly`, `deprecated` are dropped
//! - the OpenAPI `examples` map becomes a plain array of example values
//! - YAML `null` literals inside `type` arrays become the string `"null"`

use serde_json::{Map, Value};

const DROPPED_KEYWORDS: [&str; 7] = [
    "nullable",
    "example",
    "xml",
    "externalDocs",
    "readOnly",
    "writeOnly",
    "deprecated",
];

/// Keywords whose value is a single subschema
const SCHEMA_KEYWORDS: [&str; 10] = [
    "additionalProperties",
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
    "contentSchema",
];

/// Keywords whose value is an array of subschemas
const SCHEMA_ARRAY_KEYWORDS: [&str; 4] = ["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value maps names to subschemas
const SCHEMA_MAP_KEYWORDS: [&str; 5] = [
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Clean one schema node and everything below it.
pub fn clean_schema(schema: &Value) -> Value {
    let Value::Object(obj) = schema else {
        return schema.clone();
    };

    let nullable = obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    let mut out = Map::with_capacity(obj.len());

    for (key, value) in obj {
        let key_str = key.as_str();
        if DROPPED_KEYWORDS.contains(&key_str) {
            continue;
        }
        let cleaned = match key_str {
            "type" => repair_type(value),
            "examples" => examples_to_array(value),
            "items" => match value {
                Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
                other => clean_schema(other),
            },
            k if SCHEMA_KEYWORDS.contains(&k) => clean_schema(value),
            k if SCHEMA_ARRAY_KEYWORDS.contains(&k) => match value {
                Value::Array(list) => Value::Array(list.iter().map(clean_schema).collect()),
                other => other.clone(),
            },
            k if SCHEMA_MAP_KEYWORDS.contains(&k) => clean_schema_map(value),
            // enum, const, default and vendor extensions are data, not schemas
            _ => value.clone(),
        };
        out.insert(key.clone(), cleaned);
    }

    if nullable {
        if let Some(ty) = out.get("type").cloned() {
            out.insert("type".to_string(), add_null_type(&ty));
        }
    }
    Value::Object(out)
}

/// Clean every schema in a name → schema map, keeping the names.
pub fn clean_schema_map(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, schema)| (name.clone(), clean_schema(schema)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Clean a whole OpenAPI document so local `$ref`s land on cleaned schemas.
///
/// Only schema positions are rewritten: `components.schemas` members and any
/// `schema` member found elsewhere (parameters, media types, headers).
pub fn clean_document(document: &Value) -> Value {
    clean_container(document, false)
}

fn clean_container(value: &Value, in_components: bool) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| {
                    let cleaned = match key.as_str() {
                        "schema" => clean_schema(child),
                        "schemas" if in_components => clean_schema_map(child),
                        "components" => clean_container(child, true),
                        _ => clean_container(child, false),
                    };
                    (key.clone(), cleaned)
                })
                .collect(),
        ),
        Value::Array(list) => Value::Array(list.iter().map(|v| clean_container(v, false)).collect()),
        other => other.clone(),
    }
}

fn repair_type(value: &Value) -> Value {
    match value {
        Value::Array(types) => {
            let mut out: Vec<Value> = Vec::with_capacity(types.len());
            for t in types {
                let t = match t {
                    Value::Null => Value::String("null".to_string()),
                    other => other.clone(),
                };
                if !out.contains(&t) {
                    out.push(t);
                }
            }
            Value::Array(out)
        }
        Value::Null => Value::String("null".to_string()),
        other => other.clone(),
    }
}

fn add_null_type(ty: &Value) -> Value {
    let null = Value::String("null".to_string());
    match ty {
        Value::String(s) if s == "null" => ty.clone(),
        Value::String(_) => Value::Array(vec![ty.clone(), null]),
        Value::Array(types) => {
            let mut types = types.clone();
            if !types.contains(&null) {
                types.push(null);
            }
            Value::Array(types)
        }
        other => other.clone(),
    }
}

/// OpenAPI `examples` is a map of Example Objects; JSON Schema wants an array.
fn examples_to_array(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Array(
            map.values()
                .map(|example| match example.get("value") {
                    Some(v) => v.clone(),
                    None => example.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
