use super::clean::{clean_document, clean_schema};
use super::discriminator::{discriminator_for_request, Discriminator};
use crate::content::{discover_content_rules, ContentRule};
use crate::error::SpecError;
use crate::spec::{ApiSpec, OperationMeta, ParameterMeta};
use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// URI the cleaned OpenAPI document is registered under.
///
/// Local `#/components/...` references are rewritten against it so every
/// compiled schema resolves them through [`DocumentRetriever`].
pub const SPEC_BASE_URI: &str = "https://zen-validation.local/openapi.json";

/// Serves the cleaned document for [`SPEC_BASE_URI`] and refuses anything
/// else, so compilation never touches the network.
struct DocumentRetriever {
    document: Arc<Value>,
}

impl Retrieve for DocumentRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let resource = uri_str.split('#').next().unwrap_or(uri_str);
        if resource == SPEC_BASE_URI {
            return Ok(self.document.as_ref().clone());
        }
        Err(format!("external reference '{uri_str}' is not supported").into())
    }
}

/// Rewrite every local `$ref` (`#/...`) to an absolute reference into the
/// base document.
pub fn absolutize_refs(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let rewritten = match (key.as_str(), value) {
                        ("$ref", Value::String(r)) if r.starts_with('#') => {
                            Value::String(format!("{SPEC_BASE_URI}{r}"))
                        }
                        _ => absolutize_refs(value),
                    };
                    (key.clone(), rewritten)
                })
                .collect(),
        ),
        Value::Array(list) => Value::Array(list.iter().map(absolutize_refs).collect()),
        other => other.clone(),
    }
}

fn is_bare_local_ref(schema: &Value) -> Option<&str> {
    let obj = schema.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("$ref")
        .and_then(Value::as_str)
        .filter(|r| r.starts_with('#'))
}

/// A parameter with its compiled schema.
pub struct CompiledParameter {
    pub meta: ParameterMeta,
    /// `None` when the parameter declares no schema
    pub validator: Option<Validator>,
    pub content_rules: Vec<ContentRule>,
}

/// Runtime-ready form of one operation. Read-only after compilation.
pub struct CompiledOperation {
    pub operation: Arc<OperationMeta>,
    pub body: Option<Validator>,
    pub content_rules: Vec<ContentRule>,
    pub discriminator: Option<Discriminator>,
    pub parameters: Vec<CompiledParameter>,
}

impl CompiledOperation {
    pub fn operation_id(&self) -> &str {
        &self.operation.operation_id
    }

    pub fn body_required(&self) -> bool {
        self.operation.request_body_required
    }

    pub fn content_types(&self) -> &[String] {
        &self.operation.content_types
    }
}

/// Every compiled operation, keyed by operation id.
pub struct CompiledSpec {
    operations: HashMap<String, CompiledOperation>,
}

impl CompiledSpec {
    pub fn get(&self, operation_id: &str) -> Option<&CompiledOperation> {
        self.operations.get(operation_id)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledOperation> {
        self.operations.values()
    }
}

/// Compiles request schemas of an [`ApiSpec`] against its cleaned document.
pub struct SchemaCompiler {
    raw: Arc<Value>,
    cleaned: Arc<Value>,
}

impl SchemaCompiler {
    pub fn new(spec: &ApiSpec) -> Self {
        SchemaCompiler {
            raw: Arc::new(spec.document.clone()),
            cleaned: Arc::new(clean_document(&spec.document)),
        }
    }

    fn options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(DocumentRetriever {
            document: Arc::clone(&self.cleaned),
        });
        opts
    }

    /// Produce the evaluable form of a raw schema node.
    ///
    /// A bare local `$ref` points straight into the base document; an inline
    /// schema is cleaned and has its references made absolute.
    pub fn prepare(&self, schema: &Value) -> Value {
        match is_bare_local_ref(schema) {
            Some(r) => serde_json::json!({ "$ref": format!("{SPEC_BASE_URI}{r}") }),
            None => absolutize_refs(&clean_schema(schema)),
        }
    }

    /// Compile one raw schema node.
    pub fn compile_schema(&self, schema: &Value, operation_id: &str) -> Result<Validator, SpecError> {
        let prepared = self.prepare(schema);
        self.options()
            .build(&prepared)
            .map_err(|e| SpecError::Schema {
                operation_id: operation_id.to_string(),
                message: e.to_string(),
            })
    }

    pub fn compile_operation(&self, operation: &Arc<OperationMeta>) -> Result<CompiledOperation, SpecError> {
        let operation_id = operation.operation_id.as_str();

        let (body, content_rules, discriminator) = match &operation.request_schema {
            Some(schema) => (
                Some(self.compile_schema(schema, operation_id)?),
                discover_content_rules(&self.raw, schema),
                discriminator_for_request(&self.raw, schema),
            ),
            None => (None, Vec::new(), None),
        };

        let mut parameters = Vec::with_capacity(operation.parameters.len());
        for param in &operation.parameters {
            let (validator, rules) = match &param.schema {
                Some(schema) => (
                    Some(self.compile_schema(schema, operation_id)?),
                    discover_content_rules(&self.raw, schema),
                ),
                None => (None, Vec::new()),
            };
            parameters.push(CompiledParameter {
                meta: param.clone(),
                validator,
                content_rules: rules,
            });
        }

        debug!(
            operation_id = %operation_id,
            has_body_schema = body.is_some(),
            parameters = parameters.len(),
            content_rules = content_rules.len(),
            discriminator = discriminator.as_ref().map(|d| d.property_name.as_str()),
            "Operation compiled"
        );

        Ok(CompiledOperation {
            operation: Arc::clone(operation),
            body,
            content_rules,
            discriminator,
            parameters,
        })
    }

    /// Compile every operation. The first schema that fails to compile
    /// aborts the whole build.
    pub fn compile(&self, spec: &ApiSpec) -> Result<CompiledSpec, SpecError> {
        let mut operations = HashMap::with_capacity(spec.operations.len());
        for operation in &spec.operations {
            let compiled = self.compile_operation(operation)?;
            operations.insert(operation.operation_id.clone(), compiled);
        }
        info!(
            operations = operations.len(),
            fingerprint = %spec.fingerprint,
            "Request schemas compiled"
        );
        Ok(CompiledSpec { operations })
    }
}
