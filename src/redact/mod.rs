//! # Redact Module
//!
//! Sanitizes request and response bodies and headers before they are logged.
//!
//! Each operation gets a [`RouteRedaction`] built once from the document:
//! a request body tree, a response body tree and a set of header names.
//! Sensitive body fields are properties marked `x-sensitive: true` or
//! `format: password`. Sensitive headers are header parameters marked
//! sensitive, the credential-carrying header of every security scheme the
//! operation references, plus any names configured globally.

mod discover;
mod headers;
mod tree;

pub use discover::{is_sensitive, sensitive_paths};
pub use headers::{format_headers, is_infrastructure_header};
pub use tree::{compact_json, redact_body, redact_value, RedactionNode, ITEMS_SEGMENT, REDACTED};

use crate::spec::{ApiSpec, OperationMeta, ParameterLocation};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Redaction rules for one operation.
#[derive(Debug, Clone, Default)]
pub struct RouteRedaction {
    pub request: Option<RedactionNode>,
    pub response: Option<RedactionNode>,
    /// Lowercased header names
    pub headers: HashSet<String>,
}

impl RouteRedaction {
    pub fn build(spec: &ApiSpec, operation: &OperationMeta, extra_headers: &[String]) -> Self {
        let document = &spec.document;

        let request = operation
            .request_schema
            .as_ref()
            .and_then(|schema| RedactionNode::from_paths(sensitive_paths(document, schema)));

        let response_paths: Vec<Vec<String>> = operation
            .response_schemas
            .values()
            .flat_map(|schema| sensitive_paths(document, schema))
            .collect();
        let response = RedactionNode::from_paths(response_paths);

        let mut headers: HashSet<String> = extra_headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        for param in operation.parameters_in(ParameterLocation::Header) {
            let schema_sensitive = param
                .schema
                .as_ref()
                .and_then(|s| crate::spec::deref(document, s))
                .is_some_and(is_sensitive);
            if param.sensitive || schema_sensitive {
                headers.insert(param.name.to_ascii_lowercase());
            }
        }
        for requirement in &operation.security {
            for name in requirement.scheme_names() {
                if let Some(carrier) = spec.security_schemes.get(name).and_then(|s| s.carrier_header()) {
                    headers.insert(carrier);
                }
            }
        }

        RouteRedaction {
            request,
            response,
            headers,
        }
    }

    pub fn redact_request(&self, body: &[u8]) -> String {
        redact_body(body, self.request.as_ref())
    }

    pub fn redact_response(&self, body: &[u8]) -> String {
        redact_body(body, self.response.as_ref())
    }

    pub fn format_headers<K, V>(&self, headers: impl IntoIterator<Item = (K, V)>) -> Vec<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        format_headers(headers, &self.headers)
    }
}

/// Redaction rules for every operation, keyed by operation id.
#[derive(Debug, Clone, Default)]
pub struct RedactionTable {
    routes: HashMap<String, RouteRedaction>,
    /// Used for requests that did not match any operation
    fallback: RouteRedaction,
}

impl RedactionTable {
    pub fn from_spec(spec: &ApiSpec, extra_headers: &[String]) -> Self {
        let routes: HashMap<String, RouteRedaction> = spec
            .operations
            .iter()
            .map(|op| (op.operation_id.clone(), RouteRedaction::build(spec, op, extra_headers)))
            .collect();
        let fallback = RouteRedaction {
            headers: extra_headers
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .chain(std::iter::once("authorization".to_string()))
                .collect(),
            ..Default::default()
        };
        debug!(
            routes = routes.len(),
            with_request_tree = routes.values().filter(|r| r.request.is_some()).count(),
            "Redaction table built"
        );
        RedactionTable { routes, fallback }
    }

    pub fn get(&self, operation_id: &str) -> Option<&RouteRedaction> {
        self.routes.get(operation_id)
    }

    /// Rules for an operation, or the fallback set for unmatched requests.
    pub fn for_operation(&self, operation_id: Option<&str>) -> &RouteRedaction {
        operation_id
            .and_then(|id| self.routes.get(id))
            .unwrap_or(&self.fallback)
    }
}
