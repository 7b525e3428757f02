use crate::spec::{resolve_local_ref, schema_ref_name};
use serde_json::Value;
use std::collections::BTreeMap;

/// OpenAPI discriminator attached to a `oneOf`/`anyOf` request schema.
///
/// Informational only: branch selection is always left to full `oneOf`
/// evaluation by the schema evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    pub property_name: String,
    /// Discriminator value → schema reference (`dog` → `#/components/schemas/Dog`)
    pub mapping: BTreeMap<String, String>,
}

impl Discriminator {
    pub fn schema_for(&self, value: &str) -> Option<&str> {
        self.mapping.get(value).map(String::as_str)
    }
}

/// Extract discriminator metadata from an uncleaned schema.
///
/// Requires `oneOf` or `anyOf` plus `discriminator.propertyName`. The mapping
/// comes from `discriminator.mapping` when present; otherwise every branch
/// that is a `$ref` to a component schema maps its component name.
pub fn extract_discriminator(schema: &Value) -> Option<Discriminator> {
    let branches = schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array)?;
    let disc = schema.get("discriminator")?;
    let property_name = disc.get("propertyName").and_then(Value::as_str)?;

    let mapping = match disc.get("mapping").and_then(Value::as_object) {
        Some(explicit) => explicit
            .iter()
            .filter_map(|(value, target)| Some((value.clone(), target.as_str()?.to_string())))
            .collect(),
        None => branches
            .iter()
            .filter_map(|branch| {
                let target = branch.get("$ref").and_then(Value::as_str)?;
                let name = schema_ref_name(branch)?;
                Some((name.to_string(), target.to_string()))
            })
            .collect(),
    };

    Some(Discriminator {
        property_name: property_name.to_string(),
        mapping,
    })
}

/// Extract a discriminator from a request schema, following a bare `$ref`
/// to the component it names.
pub fn discriminator_for_request(document: &Value, schema: &Value) -> Option<Discriminator> {
    if let Some(target) = schema.get("$ref").and_then(Value::as_str) {
        return resolve_local_ref(document, target).and_then(extract_discriminator);
    }
    extract_discriminator(schema)
}
