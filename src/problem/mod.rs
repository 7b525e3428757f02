//! # Problem Module
//!
//! Structured error documents returned for rejected requests, and the
//! transformer that flattens schema evaluator output into field errors.
//!
//! ```json
//! {
//!   "requestId": "req_01J...",
//!   "title": "Bad Request",
//!   "detail": "One or more fields failed validation",
//!   "status": 400,
//!   "type": "/errors/validation/bad-request",
//!   "errors": [{"location": "body.id", "message": "...", "fix": "Add the required field 'id'"}]
//! }
//! ```

mod transform;

pub use transform::{flatten_output, pointer_to_location, suggest_fix};

use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    UnsupportedMediaType,
}

impl ProblemKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ProblemKind::BadRequest => StatusCode::BAD_REQUEST,
            ProblemKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ProblemKind::Forbidden => StatusCode::FORBIDDEN,
            ProblemKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    pub fn title(&self) -> &'static str {
        self.status().canonical_reason().unwrap_or("Error")
    }

    pub fn type_uri(&self) -> &'static str {
        match self {
            ProblemKind::BadRequest => "/errors/validation/bad-request",
            ProblemKind::Unauthorized => "/errors/auth/unauthorized",
            ProblemKind::Forbidden => "/errors/auth/forbidden",
            ProblemKind::UnsupportedMediaType => "/errors/validation/unsupported-media-type",
        }
    }
}

/// One field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// `body.items[0].name`, `query.limit`, `header.x-trace-id`, ...
    pub location: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl FieldError {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            location: location.into(),
            message: message.into(),
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

/// Error document for a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub request_id: String,
    pub title: String,
    pub detail: String,
    pub status: u16,
    #[serde(rename = "type")]
    pub type_uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Problem {
    pub fn new(kind: ProblemKind, request_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Problem {
            request_id: request_id.into(),
            title: kind.title().to_string(),
            detail: detail.into(),
            status: kind.status().as_u16(),
            type_uri: kind.type_uri().to_string(),
            errors: Vec::new(),
        }
    }

    /// A 400 carrying every collected field error.
    pub fn validation(request_id: impl Into<String>, errors: Vec<FieldError>) -> Self {
        let detail = if errors.len() == 1 {
            "One field failed validation".to_string()
        } else {
            format!("{} fields failed validation", errors.len())
        };
        Problem {
            errors,
            ..Problem::new(ProblemKind::BadRequest, request_id, detail)
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_REQUEST)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
