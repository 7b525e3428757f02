//! # Security Module
//!
//! Credential-presence checks for OpenAPI security requirements.
//!
//! A route's `security` list is a set of alternatives: the request passes if
//! any one requirement is satisfied (OR), and a requirement is satisfied
//! only when every scheme it names is satisfied (AND). An empty list makes
//! the route public.
//!
//! Checks are presence-only. Tokens are never decoded or verified and
//! declared scopes are not enforced; that belongs to the service behind the
//! validator.
//!
//! | Scheme | Satisfied when |
//! |---|---|
//! | http `bearer` | `Authorization: Bearer <non-blank>` (prefix case-insensitive) |
//! | http `basic` | `Authorization: Basic <non-blank>` |
//! | apiKey | the named header, query parameter or cookie is present |
//! | oauth2 / openIdConnect | a non-empty `Authorization` header |

use crate::request::QueryParams;
use crate::spec::{ApiKeyLocation, SecurityRequirement, SecurityScheme};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Credentials of one request. Header names must be lowercased.
#[derive(Debug, Clone, Copy)]
pub struct SecurityRequest<'a> {
    pub headers: &'a HashMap<String, String>,
    pub query: &'a QueryParams,
    pub cookies: &'a HashMap<String, String>,
}

impl<'a> SecurityRequest<'a> {
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&'a str> {
        self.query.get(name)
    }

    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&'a str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Why a strict bearer check failed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BearerAuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("Authorization header must use the Bearer scheme")]
    WrongScheme,
    #[error("bearer token is empty")]
    EmptyToken,
}

/// No security alternative was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// A failed alternative required an HTTP bearer scheme
    pub bearer_expected: bool,
}

impl AuthFailure {
    pub fn detail(&self) -> &'static str {
        if self.bearer_expected {
            "A valid Bearer token is required in the Authorization header"
        } else {
            "Authentication required"
        }
    }
}

/// `Authorization` value with the given auth scheme and a non-blank credential.
fn has_scheme_credential(header: Option<&str>, scheme: &str) -> bool {
    let Some(header) = header else {
        return false;
    };
    let header = header.trim_start();
    let prefix_len = scheme.len() + 1;
    if header.len() <= prefix_len || !header.is_char_boundary(prefix_len) {
        return false;
    }
    let (prefix, credential) = header.split_at(prefix_len);
    prefix
        .get(..scheme.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(scheme))
        && prefix.ends_with(' ')
        && !credential.trim().is_empty()
}

/// Whether one scheme's credential is present on the request.
pub fn scheme_satisfied(scheme: &SecurityScheme, req: &SecurityRequest<'_>) -> bool {
    match scheme {
        SecurityScheme::Http { scheme, .. } => {
            has_scheme_credential(req.get_header("authorization"), scheme)
        }
        SecurityScheme::ApiKey { name, location } => match location {
            ApiKeyLocation::Header => req.get_header(name).is_some(),
            ApiKeyLocation::Query => req.get_query(name).is_some(),
            ApiKeyLocation::Cookie => req.get_cookie(name).is_some(),
            ApiKeyLocation::Path => false,
        },
        SecurityScheme::OAuth2 | SecurityScheme::OpenIdConnect => req
            .get_header("authorization")
            .is_some_and(|v| !v.trim().is_empty()),
    }
}

/// Evaluate a route's security alternatives.
///
/// A scheme name missing from `schemes` never satisfies its requirement.
pub fn validate_security(
    requirements: &[SecurityRequirement],
    schemes: &BTreeMap<String, SecurityScheme>,
    req: &SecurityRequest<'_>,
) -> Result<(), AuthFailure> {
    if requirements.is_empty() {
        return Ok(());
    }

    let mut bearer_expected = false;
    for (idx, requirement) in requirements.iter().enumerate() {
        let mut ok = true;
        for name in requirement.scheme_names() {
            let Some(scheme) = schemes.get(name) else {
                ok = false;
                break;
            };
            if !scheme_satisfied(scheme, req) {
                ok = false;
                break;
            }
        }
        if ok {
            debug!(alternative = idx, "Security requirement satisfied");
            return Ok(());
        }
        bearer_expected |= requirement
            .scheme_names()
            .any(|name| schemes.get(name).is_some_and(SecurityScheme::is_bearer));
    }
    Err(AuthFailure { bearer_expected })
}

/// Strict bearer check returning the token.
pub fn validate_bearer_auth<'h>(authorization: Option<&'h str>) -> Result<&'h str, BearerAuthError> {
    let header = authorization
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(BearerAuthError::MissingHeader)?;
    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerAuthError::WrongScheme);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(BearerAuthError::EmptyToken);
    }
    Ok(token)
}
