//! Router core module - hot path for request routing.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use crate::error::SpecError;
use crate::spec::{operation_key, ApiSpec, OperationMeta};
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Path parameters in template order.
///
/// Names are `Arc<str>` shared with the compiled route; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request to an operation
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub operation: Arc<OperationMeta>,
    /// Captured template segments (`{id}` → `("id", "123")`)
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a template repeats a name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn operation_id(&self) -> &str {
        &self.operation.operation_id
    }
}

/// A templated route: method, compiled regex, parameter names in order
#[derive(Clone)]
struct TemplateRoute {
    method: Method,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    operation: Arc<OperationMeta>,
}

/// Matches `(method, path)` pairs to operations.
///
/// Exact paths live in a `"METHOD PATH"` table. Templated paths are tried in
/// document order, so the first declared template wins when two overlap.
#[derive(Clone)]
pub struct Router {
    exact: HashMap<String, Arc<OperationMeta>>,
    templates: Vec<TemplateRoute>,
}

impl Router {
    pub fn from_spec(spec: &ApiSpec) -> Result<Self, SpecError> {
        Self::new(spec.operations.iter().cloned())
    }

    pub fn new(operations: impl IntoIterator<Item = Arc<OperationMeta>>) -> Result<Self, SpecError> {
        let mut exact = HashMap::new();
        let mut templates = Vec::new();

        for operation in operations {
            if operation.is_templated() {
                let (regex, param_names) = Self::path_to_regex(&operation.path_pattern)?;
                templates.push(TemplateRoute {
                    method: operation.method.clone(),
                    regex,
                    param_names,
                    operation,
                });
            } else {
                exact.insert(operation.key(), operation);
            }
        }

        info!(
            exact_routes = exact.len(),
            templated_routes = templates.len(),
            "Routing table loaded"
        );
        Ok(Self { exact, templates })
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Match an HTTP request to an operation.
    ///
    /// The method is compared case-insensitively. `None` means no route;
    /// turning that into a 404 is the caller's job.
    #[must_use]
    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let key = operation_key(method, path);
        if let Some(operation) = self.exact.get(&key) {
            debug!(method = %method, path = %path, operation_id = %operation.operation_id, "Exact route matched");
            return Some(RouteMatch {
                operation: Arc::clone(operation),
                path_params: ParamVec::new(),
            });
        }

        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).ok()?;
        for route in self.templates.iter().filter(|r| r.method == method) {
            let Some(captures) = route.regex.captures(path) else {
                continue;
            };
            let path_params: ParamVec = route
                .param_names
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, value)| Some((Arc::clone(name), value?.as_str().to_string())))
                .collect();
            debug!(
                method = %method,
                path = %path,
                operation_id = %route.operation.operation_id,
                route_pattern = %route.operation.path_pattern,
                "Templated route matched"
            );
            return Some(RouteMatch {
                operation: Arc::clone(&route.operation),
                path_params,
            });
        }

        debug!(method = %method, path = %path, "No route matched");
        None
    }

    /// Convert an OpenAPI path template to an anchored regex.
    ///
    /// `{name}` becomes `([^/]+)`; every other character is matched literally.
    /// Parameter names are returned in template order.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), SpecError> {
        let route_error = |message: String| SpecError::Route {
            path: path.to_string(),
            message,
        };

        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());
        let mut literal = String::new();
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }
            let mut name = String::new();
            let mut closed = false;
            for n in chars.by_ref() {
                if n == '}' {
                    closed = true;
                    break;
                }
                name.push(n);
            }
            if !closed || name.is_empty() {
                return Err(route_error("unterminated or empty path parameter".to_string()));
            }
            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            pattern.push_str("([^/]+)");
            param_names.push(Arc::from(name.as_str()));
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| route_error(e.to_string()))?;
        Ok((regex, param_names))
    }
}
