use super::{ValidationOutcome, ValidationRequest};
use crate::content::{resolve_path, ContentRule};
use crate::error::SpecError;
use crate::ids::RequestId;
use crate::params::{extract_parameter, ParamSource};
use crate::problem::{flatten_output, FieldError, Problem, ProblemKind};
use crate::redact::RedactionTable;
use crate::router::{RouteMatch, Router};
use crate::runtime_config::ValidationConfig;
use crate::schema::{evaluate, CompiledOperation, CompiledSpec, SchemaCompiler};
use crate::security::{validate_security, SecurityRequest};
use crate::spec::{load_spec, parse_spec_str, ApiSpec, ParameterLocation};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// Compiled, immutable request validator for one document.
pub struct RequestValidator {
    spec: ApiSpec,
    router: Router,
    compiled: CompiledSpec,
    redaction: RedactionTable,
    config: ValidationConfig,
}

/// Whether `content_type` is one of `declared`. Parameters after `;` are
/// ignored and comparison is case-insensitive; declared `type/*` and `*/*`
/// act as wildcards.
pub fn content_type_allowed(content_type: &str, declared: &[String]) -> bool {
    let essence = media_essence(content_type);
    declared.iter().any(|d| {
        let d = media_essence(d);
        d == "*/*"
            || d == essence
            || d
                .strip_suffix("/*")
                .is_some_and(|ty| essence.split('/').next() == Some(ty))
    })
}

fn media_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json_media(content_type: Option<&str>) -> bool {
    match content_type.map(media_essence) {
        None => true,
        Some(essence) => essence == "application/json" || essence.ends_with("+json"),
    }
}

fn check_content_rules(rules: &[ContentRule], value: &Value, prefix: &str, errors: &mut Vec<FieldError>) {
    for rule in rules {
        for (loc, found) in resolve_path(value, &rule.path) {
            let Some(text) = found.as_str() else {
                continue;
            };
            if let Err(e) = rule.check(text) {
                errors.push(FieldError::new(format!("{prefix}{loc}"), e.to_string()).with_fix(e.fix()));
            }
        }
    }
}

impl RequestValidator {
    /// Compile every operation. Fails on the first schema or route that
    /// cannot be compiled.
    pub fn new(spec: ApiSpec, config: ValidationConfig) -> Result<Self, SpecError> {
        let router = Router::from_spec(&spec)?;
        let compiled = SchemaCompiler::new(&spec).compile(&spec)?;
        let redaction = RedactionTable::from_spec(&spec, &config.redact_headers);
        info!(
            operations = spec.operations.len(),
            templated = spec.operations.iter().filter(|op| op.is_templated()).count(),
            fingerprint = %spec.fingerprint,
            enabled = config.enabled,
            "Request validator ready"
        );
        Ok(RequestValidator {
            spec,
            router,
            compiled,
            redaction,
            config,
        })
    }

    pub fn from_spec_str(content: &str, config: ValidationConfig) -> Result<Self, SpecError> {
        Self::new(parse_spec_str(content)?, config)
    }

    pub fn from_file(path: impl AsRef<Path>, config: ValidationConfig) -> Result<Self, SpecError> {
        Self::new(load_spec(path)?, config)
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn redaction(&self) -> &RedactionTable {
        &self.redaction
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one request.
    ///
    /// A streamed body is buffered onto the request, so downstream code can
    /// read it through [`super::RequestBody::reader`] afterwards.
    pub fn validate(&self, request: &mut ValidationRequest) -> ValidationOutcome {
        let Some(route) = self.router.match_route(&request.method, &request.path) else {
            debug!(method = %request.method, path = %request.path, "No route matched");
            return ValidationOutcome::NoMatch;
        };
        if !self.config.enabled {
            return ValidationOutcome::Valid(route);
        }
        let Some(compiled) = self.compiled.get(route.operation_id()) else {
            warn!(operation_id = %route.operation_id(), "Matched operation was not compiled");
            return ValidationOutcome::Valid(route);
        };

        let request_id = RequestId::resolve(
            request.request_id.as_deref(),
            request
                .headers
                .get(&self.config.request_id_header)
                .map(String::as_str),
        );

        match self.check(compiled, &route, request, request_id.as_str()) {
            Ok(()) => {
                debug!(operation_id = %route.operation_id(), request_id = %request_id, "Request valid");
                ValidationOutcome::Valid(route)
            }
            Err(problem) => {
                warn!(
                    operation_id = %route.operation_id(),
                    status = problem.status,
                    errors = problem.errors.len(),
                    request_id = %request_id,
                    detail = %problem.detail,
                    "Request rejected"
                );
                ValidationOutcome::Invalid { route, problem }
            }
        }
    }

    fn check(
        &self,
        compiled: &CompiledOperation,
        route: &RouteMatch,
        request: &mut ValidationRequest,
        request_id: &str,
    ) -> Result<(), Problem> {
        self.check_security(compiled, request, request_id)?;
        check_content_type(compiled, request, request_id)?;
        check_parameters(compiled, route, request, request_id)?;
        self.check_body(compiled, request, request_id)
    }

    fn check_security(
        &self,
        compiled: &CompiledOperation,
        request: &ValidationRequest,
        request_id: &str,
    ) -> Result<(), Problem> {
        let sec = SecurityRequest {
            headers: &request.headers,
            query: &request.query,
            cookies: &request.cookies,
        };
        validate_security(&compiled.operation.security, &self.spec.security_schemes, &sec)
            .map_err(|failure| Problem::new(ProblemKind::Unauthorized, request_id, failure.detail()))
    }

    fn check_body(
        &self,
        compiled: &CompiledOperation,
        request: &mut ValidationRequest,
        request_id: &str,
    ) -> Result<(), Problem> {
        let content_type = request.headers.get("content-type").cloned();
        let bytes = request.body.buffer(self.config.max_body_bytes).map_err(|e| {
            Problem::new(
                ProblemKind::BadRequest,
                request_id,
                format!("Failed to read request body: {e}"),
            )
        })?;

        if self.config.body_too_large(bytes.len()) {
            let detail = format!(
                "Request body exceeds the maximum of {} bytes",
                self.config.max_body_bytes
            );
            return Err(Problem::new(ProblemKind::BadRequest, request_id, detail.clone())
                .with_errors(vec![FieldError::new("body", detail)
                    .with_fix("Send a smaller request body")]));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            if compiled.body_required() {
                return Err(Problem::validation(
                    request_id,
                    vec![FieldError::new("body", "Request body is required")
                        .with_fix("Send a request body")],
                ));
            }
            return Ok(());
        }

        let Some(validator) = &compiled.body else {
            return Ok(());
        };
        if !is_json_media(content_type.as_deref()) {
            debug!(
                operation_id = %compiled.operation_id(),
                content_type = ?content_type,
                "Skipping schema validation for non-JSON body"
            );
            return Ok(());
        }

        let body: Value = serde_json::from_slice(bytes).map_err(|e| {
            Problem::validation(
                request_id,
                vec![FieldError::new("body", format!("Malformed JSON: {e}"))
                    .with_fix("Send a valid JSON document")],
            )
        })?;

        if let Some(discriminator) = &compiled.discriminator {
            let tag = body.get(&discriminator.property_name).and_then(Value::as_str);
            debug!(
                property = %discriminator.property_name,
                tag = ?tag,
                mapped = ?tag.and_then(|t| discriminator.schema_for(t)),
                "Discriminated body"
            );
        }

        let output = evaluate(validator, &body);
        let mut errors = Vec::new();
        if !output.valid {
            errors = flatten_output(&output, "body");
            if errors.is_empty() {
                let detail = output
                    .error
                    .clone()
                    .unwrap_or_else(|| "Request body failed validation".to_string());
                return Err(Problem::new(ProblemKind::BadRequest, request_id, detail));
            }
        }
        check_content_rules(&compiled.content_rules, &body, "body", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Problem::validation(request_id, errors))
        }
    }
}

fn check_content_type(
    compiled: &CompiledOperation,
    request: &ValidationRequest,
    request_id: &str,
) -> Result<(), Problem> {
    let declared = compiled.content_types();
    let Some(content_type) = request.headers.get("content-type") else {
        return Ok(());
    };
    if declared.is_empty() || content_type_allowed(content_type, declared) {
        return Ok(());
    }
    let detail = format!(
        "Content-Type '{content_type}' is not supported; expected one of: {}",
        declared.join(", ")
    );
    Err(Problem::new(ProblemKind::UnsupportedMediaType, request_id, detail).with_errors(vec![
        FieldError::new("header.content-type", format!("Unsupported media type '{content_type}'"))
            .with_fix(format!("Send one of: {}", declared.join(", "))),
    ]))
}

fn check_parameters(
    compiled: &CompiledOperation,
    route: &RouteMatch,
    request: &ValidationRequest,
    request_id: &str,
) -> Result<(), Problem> {
    let source = ParamSource {
        path: &route.path_params,
        query: &request.query,
        headers: &request.headers,
        cookies: &request.cookies,
    };

    let mut errors = Vec::new();
    for param in &compiled.parameters {
        let meta = &param.meta;
        let location = meta.location.as_str();
        let prefix = format!("{location}.{}", meta.name);

        if meta.location == ParameterLocation::Query
            && !meta.allow_empty_value
            && source.raw(meta) == Some("")
        {
            errors.push(
                FieldError::new(&prefix, "Empty value is not allowed")
                    .with_fix(format!("Provide a value for '{}' or omit it", meta.name)),
            );
            continue;
        }

        let Some(value) = extract_parameter(meta, &source) else {
            if meta.required {
                errors.push(
                    FieldError::new(&prefix, format!("Missing required {location} parameter '{}'", meta.name))
                        .with_fix(format!("Provide the '{}' {location} parameter", meta.name)),
                );
            }
            continue;
        };

        let json = value.into_json();
        if let Some(validator) = &param.validator {
            let output = evaluate(validator, &json);
            if !output.valid {
                errors.extend(flatten_output(&output, &prefix));
            }
        }
        check_content_rules(&param.content_rules, &json, &prefix, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        debug!(operation_id = %compiled.operation_id(), errors = errors.len(), "Parameter validation failed");
        Err(Problem::validation(request_id, errors))
    }
}
