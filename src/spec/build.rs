use super::types::{
    ApiKeyLocation, ApiSpec, OperationMeta, ParamShape, ParameterLocation, ParameterMeta,
    ParameterStyle, RequiredScheme, SchemaKind, SecurityRequirement, SecurityScheme,
};
use crate::error::{SpecError, SpecIssue};
use http::Method;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// HTTP verbs recognised inside a path item, in the order they are registered.
const METHODS: [(&str, Method); 7] = [
    ("get", Method::GET),
    ("post", Method::POST),
    ("put", Method::PUT),
    ("delete", Method::DELETE),
    ("patch", Method::PATCH),
    ("head", Method::HEAD),
    ("options", Method::OPTIONS),
];

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Maximum `$ref` hops followed when computing a parameter shape
const MAX_REF_DEPTH: usize = 16;

/// Resolve a local JSON pointer reference (`#/components/schemas/Pet`).
pub fn resolve_local_ref<'a>(document: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(document);
    }
    document.pointer(pointer)
}

/// Follow `$ref` chains until a non-reference node is reached.
pub fn deref<'a>(document: &'a Value, mut node: &'a Value) -> Option<&'a Value> {
    for _ in 0..MAX_REF_DEPTH {
        match node.get("$ref").and_then(Value::as_str) {
            Some(r) => node = resolve_local_ref(document, r)?,
            None => return Some(node),
        }
    }
    None
}

/// Name of a component schema referenced by a bare `$ref`, if any.
pub fn schema_ref_name(schema: &Value) -> Option<&str> {
    let obj = schema.as_object()?;
    obj.get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
}

/// Default operation id: a slug of method and path (`get /pets/{id}` → `get_pets_id`).
pub fn slugify_operation(method: &str, path: &str) -> String {
    let raw = format!("{method}_{path}").to_lowercase();
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Extract all security schemes from `components.securitySchemes`.
///
/// HTTP schemes need `scheme`; apiKey schemes need `name` and `in`.
/// OAuth2 and OpenID Connect are recorded by type only.
pub fn extract_security_schemes(
    document: &Value,
    issues: &mut Vec<SpecIssue>,
) -> BTreeMap<String, SecurityScheme> {
    let mut schemes = BTreeMap::new();
    let Some(defs) = document
        .get("components")
        .and_then(|c| c.get("securitySchemes"))
    else {
        return schemes;
    };
    let Some(defs) = defs.as_object() else {
        issues.push(SpecIssue::new(
            "components.securitySchemes",
            "InvalidType",
            "securitySchemes must be an object",
        ));
        return schemes;
    };

    for (name, raw) in defs {
        let location = format!("components.securitySchemes.{name}");
        let def = match deref(document, raw) {
            Some(d) => d,
            None => {
                issues.push(SpecIssue::new(&location, "UnresolvedRef", "cannot resolve $ref"));
                continue;
            }
        };
        let kind = def.get("type").and_then(Value::as_str).unwrap_or_default();
        let scheme = match kind {
            "http" => match def.get("scheme").and_then(Value::as_str) {
                Some(s) if !s.trim().is_empty() => SecurityScheme::Http {
                    scheme: s.trim().to_ascii_lowercase(),
                    bearer_format: def
                        .get("bearerFormat")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
                _ => {
                    issues.push(SpecIssue::new(
                        &location,
                        "MissingField",
                        "http security scheme requires 'scheme'",
                    ));
                    continue;
                }
            },
            "apiKey" => {
                let key_name = def.get("name").and_then(Value::as_str);
                let key_in = def.get("in").and_then(Value::as_str);
                let key_location = match key_in {
                    Some("header") => Some(ApiKeyLocation::Header),
                    Some("query") => Some(ApiKeyLocation::Query),
                    Some("cookie") => Some(ApiKeyLocation::Cookie),
                    Some("path") => Some(ApiKeyLocation::Path),
                    _ => None,
                };
                match (key_name, key_location) {
                    (Some(n), Some(l)) if !n.is_empty() => SecurityScheme::ApiKey {
                        name: n.to_string(),
                        location: l,
                    },
                    _ => {
                        issues.push(SpecIssue::new(
                            &location,
                            "MissingField",
                            "apiKey security scheme requires 'name' and a valid 'in'",
                        ));
                        continue;
                    }
                }
            }
            "oauth2" => SecurityScheme::OAuth2,
            "openIdConnect" => SecurityScheme::OpenIdConnect,
            other => {
                issues.push(SpecIssue::new(
                    &location,
                    "UnsupportedType",
                    format!("unsupported security scheme type '{other}'"),
                ));
                continue;
            }
        };
        schemes.insert(name.clone(), scheme);
    }
    schemes
}

/// Parse a `security` array into requirement alternatives.
pub fn extract_security_requirements(
    value: &Value,
    location: &str,
    schemes: &BTreeMap<String, SecurityScheme>,
    issues: &mut Vec<SpecIssue>,
) -> Vec<SecurityRequirement> {
    let Some(list) = value.as_array() else {
        issues.push(SpecIssue::new(location, "InvalidType", "security must be an array"));
        return Vec::new();
    };

    let mut out = Vec::with_capacity(list.len());
    for (idx, entry) in list.iter().enumerate() {
        let Some(map) = entry.as_object() else {
            issues.push(SpecIssue::new(
                format!("{location}[{idx}]"),
                "InvalidType",
                "security requirement must be an object",
            ));
            continue;
        };
        let mut requirement = SecurityRequirement::default();
        for (name, scopes) in map {
            if !schemes.contains_key(name) {
                issues.push(SpecIssue::new(
                    format!("{location}[{idx}].{name}"),
                    "UnknownScheme",
                    format!("security scheme '{name}' is not defined in components.securitySchemes"),
                ));
                continue;
            }
            let scopes = scopes
                .as_array()
                .map(|s| {
                    s.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            requirement.schemes.push(RequiredScheme {
                name: name.clone(),
                scopes,
            });
        }
        out.push(requirement);
    }
    out
}

/// Typed summary of a parameter schema, following `$ref`s.
pub fn param_shape(document: &Value, schema: Option<&Value>) -> ParamShape {
    let Some(schema) = schema.and_then(|s| deref(document, s)) else {
        return ParamShape::unknown();
    };
    let kind = SchemaKind::of(schema);
    let items = schema
        .get("items")
        .and_then(|i| deref(document, i))
        .map(SchemaKind::of)
        .unwrap_or(SchemaKind::Unknown);
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| {
                    let kind = deref(document, prop)
                        .map(SchemaKind::of)
                        .unwrap_or(SchemaKind::Unknown);
                    (name.clone(), kind)
                })
                .collect()
        })
        .unwrap_or_default();
    ParamShape {
        kind,
        items,
        properties,
    }
}

/// Extract parameter metadata from a `parameters` list.
///
/// `$ref` entries are resolved against `components.parameters`.
pub fn extract_parameters(
    document: &Value,
    params: Option<&Value>,
    location: &str,
    issues: &mut Vec<SpecIssue>,
) -> Vec<ParameterMeta> {
    let Some(params) = params else {
        return Vec::new();
    };
    let Some(list) = params.as_array() else {
        issues.push(SpecIssue::new(location, "InvalidType", "parameters must be an array"));
        return Vec::new();
    };

    let mut out = Vec::with_capacity(list.len());
    for (idx, raw) in list.iter().enumerate() {
        let loc = format!("{location}[{idx}]");
        let Some(param) = deref(document, raw) else {
            issues.push(SpecIssue::new(&loc, "UnresolvedRef", "cannot resolve parameter $ref"));
            continue;
        };
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            issues.push(SpecIssue::new(&loc, "MissingField", "parameter requires 'name'"));
            continue;
        };
        let Some(param_in) = param
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse)
        else {
            issues.push(SpecIssue::new(
                &loc,
                "InvalidValue",
                format!("parameter '{name}' requires 'in' of path, query, header or cookie"),
            ));
            continue;
        };
        let style = match param.get("style").and_then(Value::as_str) {
            Some(s) => match ParameterStyle::parse(s) {
                Some(style) => Some(style),
                None => {
                    issues.push(SpecIssue::new(
                        &loc,
                        "InvalidValue",
                        format!("parameter '{name}' has unknown style '{s}'"),
                    ));
                    continue;
                }
            },
            None => None,
        };
        let flag = |key: &str| param.get(key).and_then(Value::as_bool).unwrap_or(false);
        let schema = param.get("schema").cloned();

        out.push(ParameterMeta {
            name: name.to_string(),
            location: param_in,
            // Path parameters are always required
            required: param_in == ParameterLocation::Path || flag("required"),
            shape: param_shape(document, schema.as_ref()),
            schema,
            style,
            explode: param.get("explode").and_then(Value::as_bool),
            allow_empty_value: flag("allowEmptyValue"),
            allow_reserved: flag("allowReserved"),
            sensitive: flag("x-sensitive"),
        });
    }
    out
}

/// Merge path-item level parameters with operation parameters.
///
/// An operation entry replaces a path-item entry with the same name and location.
fn merge_parameters(
    path_level: Vec<ParameterMeta>,
    op_level: Vec<ParameterMeta>,
) -> Vec<ParameterMeta> {
    let overridden: HashSet<(String, ParameterLocation)> = op_level
        .iter()
        .map(|p| (p.name.clone(), p.location))
        .collect();
    let mut merged: Vec<ParameterMeta> = path_level
        .into_iter()
        .filter(|p| !overridden.contains(&(p.name.clone(), p.location)))
        .collect();
    merged.extend(op_level);
    merged
}

/// Request body details of one operation.
#[derive(Debug, Default)]
pub struct RequestBodyMeta {
    pub schema: Option<Value>,
    pub schema_name: Option<String>,
    pub required: bool,
    pub content_types: Vec<String>,
}

/// Extract the request body of an operation.
///
/// All declared media types are recorded; only the `application/json`
/// schema is kept, as written (the compiler resolves its `$ref`s).
pub fn extract_request_body(
    document: &Value,
    operation: &Map<String, Value>,
    location: &str,
    issues: &mut Vec<SpecIssue>,
) -> RequestBodyMeta {
    let Some(raw) = operation.get("requestBody") else {
        return RequestBodyMeta::default();
    };
    let loc = format!("{location}.requestBody");
    let Some(body) = deref(document, raw).and_then(Value::as_object) else {
        issues.push(SpecIssue::new(&loc, "InvalidType", "requestBody must be an object"));
        return RequestBodyMeta::default();
    };

    let mut meta = RequestBodyMeta {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        ..Default::default()
    };
    let Some(content) = body.get("content") else {
        return meta;
    };
    let Some(content) = content.as_object() else {
        issues.push(SpecIssue::new(&loc, "InvalidType", "requestBody.content must be an object"));
        return meta;
    };

    for (media_type, media) in content {
        meta.content_types.push(media_type.clone());
        if media_type.eq_ignore_ascii_case("application/json") {
            if let Some(schema) = media.get("schema") {
                meta.schema_name = schema_ref_name(schema).map(str::to_string);
                meta.schema = Some(schema.clone());
            }
        }
    }
    meta
}

/// Extract `application/json` response schemas keyed by status.
pub fn extract_response_schemas(
    document: &Value,
    operation: &Map<String, Value>,
) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return out;
    };
    for (status, raw) in responses {
        let schema = deref(document, raw)
            .and_then(|r| r.get("content"))
            .and_then(|c| c.get("application/json"))
            .and_then(|m| m.get("schema"));
        if let Some(schema) = schema {
            out.insert(status.clone(), schema.clone());
        }
    }
    out
}

/// Walk `paths` and build every operation.
pub fn build_operations(
    document: &Value,
    schemes: &BTreeMap<String, SecurityScheme>,
    global_security: &[SecurityRequirement],
    issues: &mut Vec<SpecIssue>,
) -> Vec<Arc<OperationMeta>> {
    let mut operations = Vec::new();
    let Some(paths) = document.get("paths") else {
        return operations;
    };
    let Some(paths) = paths.as_object() else {
        issues.push(SpecIssue::new("paths", "InvalidType", "paths must be an object"));
        return operations;
    };

    let mut seen_ids: HashSet<String> = HashSet::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            issues.push(SpecIssue::new(
                format!("paths.{path}"),
                "InvalidType",
                "path item must be an object",
            ));
            continue;
        };
        let path_params = extract_parameters(
            document,
            item.get("parameters"),
            &format!("paths.{path}.parameters"),
            issues,
        );

        for (verb, method) in METHODS.iter() {
            // Other path-item keys (parameters, servers, summary, x-*) are skipped
            let Some(raw_op) = item.get(*verb) else {
                continue;
            };
            let location = format!("paths.{path}.{verb}");
            let Some(op) = raw_op.as_object() else {
                issues.push(SpecIssue::new(&location, "InvalidType", "operation must be an object"));
                continue;
            };

            let operation_id = op
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| slugify_operation(verb, path));
            if !seen_ids.insert(operation_id.clone()) {
                issues.push(SpecIssue::new(
                    &location,
                    "DuplicateOperationId",
                    format!("operationId '{operation_id}' is used more than once"),
                ));
                continue;
            }

            let op_params = extract_parameters(
                document,
                op.get("parameters"),
                &format!("{location}.parameters"),
                issues,
            );
            let parameters = merge_parameters(path_params.clone(), op_params);
            let body = extract_request_body(document, op, &location, issues);

            // An explicit empty array makes the operation public
            let security = match op.get("security") {
                Some(sec) => extract_security_requirements(
                    sec,
                    &format!("{location}.security"),
                    schemes,
                    issues,
                ),
                None => global_security.to_vec(),
            };

            debug!(
                method = %method,
                path = %path,
                operation_id = %operation_id,
                parameters = parameters.len(),
                security_alternatives = security.len(),
                "Operation parsed"
            );

            operations.push(Arc::new(OperationMeta {
                method: method.clone(),
                path_pattern: Arc::from(path.as_str()),
                operation_id,
                request_schema: body.schema,
                request_schema_name: body.schema_name,
                request_body_required: body.required,
                content_types: body.content_types,
                parameters,
                security,
                response_schemas: extract_response_schemas(document, op),
            }));
        }
    }
    operations
}

/// Build an [`ApiSpec`] from a decoded document.
///
/// Every problem found is collected; any problem fails the whole build.
pub fn build_spec(document: Value, fingerprint: String) -> Result<ApiSpec, SpecError> {
    let mut issues = Vec::new();
    if !document.is_object() {
        issues.push(SpecIssue::new("$", "InvalidType", "spec document must be an object"));
        SpecError::check(std::mem::take(&mut issues))?;
    }

    let security_schemes = extract_security_schemes(&document, &mut issues);
    let global_security = match document.get("security") {
        Some(sec) => extract_security_requirements(sec, "security", &security_schemes, &mut issues),
        None => Vec::new(),
    };
    let operations = build_operations(&document, &security_schemes, &global_security, &mut issues);

    SpecError::check(issues)?;
    Ok(ApiSpec {
        document,
        operations,
        security_schemes,
        global_security,
        fingerprint,
    })
}
