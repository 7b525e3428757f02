//! Adapter between the JSON Schema evaluator and the error transformer.
//!
//! The request pipeline consumes a hierarchical output unit (valid flag,
//! own error, locations, nested children). `jsonschema` reports a flat error
//! iterator; each error becomes one child of a root unit. A failed
//! `oneOf`/`anyOf` gets one child per failing branch, built from the basic
//! output format, so the errors inside each branch stay visible.
//! `required` and `additionalProperties` failures also carry the offending
//! property name, because their instance location points at the parent
//! object.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{BasicOutput, Validator};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputUnit {
    pub valid: bool,
    /// Schema-side JSON pointer (`/properties/age/minimum`)
    pub keyword_location: String,
    /// Instance-side JSON pointer (`/age`)
    pub instance_location: String,
    pub error: Option<String>,
    /// Property named by a `required` / `additionalProperties` failure
    pub property: Option<String>,
    pub children: Vec<OutputUnit>,
}

impl OutputUnit {
    pub fn valid() -> Self {
        OutputUnit {
            valid: true,
            ..Default::default()
        }
    }

    pub fn invalid(
        keyword_location: impl Into<String>,
        instance_location: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        OutputUnit {
            valid: false,
            keyword_location: keyword_location.into(),
            instance_location: instance_location.into(),
            error: Some(error.into()),
            property: None,
            children: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_child(mut self, child: OutputUnit) -> Self {
        self.valid = self.valid && child.valid;
        self.children.push(child);
        self
    }

    /// Last segment of the keyword location (`minimum`, `required`, ...).
    pub fn keyword(&self) -> Option<&str> {
        self.keyword_location
            .rsplit('/')
            .next()
            .filter(|k| !k.is_empty())
    }
}

/// Evaluate `instance` and return the output tree.
pub fn evaluate(validator: &Validator, instance: &Value) -> OutputUnit {
    let mut root = OutputUnit::valid();
    let mut branch_errors: Option<Vec<BasicError>> = None;
    for error in validator.iter_errors(instance) {
        let instance_location = error.instance_path.to_string();
        let keyword_location = error.schema_path.to_string();
        match &error.kind {
            ValidationErrorKind::Required { property } => {
                let name = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                root = root.with_child(
                    OutputUnit::invalid(&keyword_location, &instance_location, error.to_string())
                        .with_property(name),
                );
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                for name in unexpected {
                    root = root.with_child(unexpected_property(&keyword_location, &instance_location, name));
                }
            }
            ValidationErrorKind::OneOfNotValid | ValidationErrorKind::AnyOf => {
                let details = branch_errors.get_or_insert_with(|| basic_errors(validator, instance));
                let unit = OutputUnit::invalid(keyword_location, instance_location, error.to_string());
                root = root.with_child(with_branches(unit, details));
            }
            _ => {
                root = root.with_child(OutputUnit::invalid(
                    keyword_location,
                    instance_location,
                    error.to_string(),
                ));
            }
        }
    }
    root
}

/// One error unit of the basic output format.
#[derive(Debug)]
struct BasicError {
    keyword_location: String,
    instance_location: String,
    message: String,
}

fn basic_errors(validator: &Validator, instance: &Value) -> Vec<BasicError> {
    match validator.apply(instance).basic() {
        BasicOutput::Valid(_) => Vec::new(),
        BasicOutput::Invalid(units) => units
            .into_iter()
            .map(|unit| BasicError {
                keyword_location: unit.keyword_location().to_string(),
                instance_location: unit.instance_location().to_string(),
                message: unit.error_description().to_string(),
            })
            .collect(),
    }
}

fn unexpected_property(keyword_location: &str, instance_location: &str, name: &str) -> OutputUnit {
    OutputUnit::invalid(
        keyword_location,
        instance_location,
        format!("Additional properties are not allowed ('{name}' was unexpected)"),
    )
    .with_property(name)
}

/// Whether `pointer` is `parent` or lies below it.
fn is_within(pointer: &str, parent: &str) -> bool {
    pointer
        .strip_prefix(parent)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Attach one child per failing branch of a combinator unit, each holding
/// the errors reported inside that branch for the same instance.
fn with_branches(mut unit: OutputUnit, details: &[BasicError]) -> OutputUnit {
    let prefix = format!("{}/", unit.keyword_location);
    let mut branches: Vec<OutputUnit> = Vec::new();
    for detail in details {
        let Some(rest) = detail.keyword_location.strip_prefix(&prefix) else {
            continue;
        };
        if !is_within(&detail.instance_location, &unit.instance_location) {
            continue;
        }
        let index = rest.split('/').next().unwrap_or_default();
        let branch_location = format!("{prefix}{index}");
        let pos = match branches.iter().position(|b| b.keyword_location == branch_location) {
            Some(pos) => pos,
            None => {
                branches.push(OutputUnit {
                    valid: false,
                    keyword_location: branch_location,
                    instance_location: unit.instance_location.clone(),
                    ..Default::default()
                });
                branches.len() - 1
            }
        };
        branches[pos].children.extend(detail_units(detail));
    }
    unit.children = branches;
    unit
}

/// Output units for one basic error. The property names of `required` and
/// `additionalProperties` failures are read back from the message.
fn detail_units(detail: &BasicError) -> Vec<OutputUnit> {
    let keyword = detail.keyword_location.rsplit('/').next().unwrap_or_default();
    match keyword {
        "required" => {
            let unit = OutputUnit::invalid(
                &detail.keyword_location,
                &detail.instance_location,
                detail.message.clone(),
            );
            let name = detail
                .message
                .strip_suffix(" is a required property")
                .and_then(|quoted| serde_json::from_str::<String>(quoted).ok());
            vec![match name {
                Some(name) => unit.with_property(name),
                None => unit,
            }]
        }
        "additionalProperties" => {
            let names = detail
                .message
                .strip_prefix("Additional properties are not allowed (")
                .and_then(|rest| {
                    rest.strip_suffix(" was unexpected)")
                        .or_else(|| rest.strip_suffix(" were unexpected)"))
                });
            match names {
                Some(names) => names
                    .split("', '")
                    .map(|name| name.trim_matches('\''))
                    .map(|name| unexpected_property(&detail.keyword_location, &detail.instance_location, name))
                    .collect(),
                None => vec![OutputUnit::invalid(
                    &detail.keyword_location,
                    &detail.instance_location,
                    detail.message.clone(),
                )],
            }
        }
        _ => vec![OutputUnit::invalid(
            &detail.keyword_location,
            &detail.instance_location,
            detail.message.clone(),
        )],
    }
}
