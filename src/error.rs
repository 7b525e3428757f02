//! Startup error types.
//!
//! Everything that can go wrong while turning an OpenAPI document into a
//! [`RequestValidator`](crate::validator::RequestValidator) is a [`SpecError`].
//! These are fatal: the engine never starts with a partially understood spec.
//! Per-request failures are not errors in this sense; they are reported as
//! [`Problem`](crate::problem::Problem) documents.

use std::fmt;
use thiserror::Error;

/// A single problem found while reading the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecIssue {
    /// Where the issue occurred (e.g. `paths./pets.get.parameters[0]`)
    pub location: String,
    /// Short machine-readable issue kind (e.g. `MissingField`)
    pub kind: String,
    /// Human-readable description
    pub message: String,
}

impl SpecIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SpecIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SpecIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Fatal error raised while loading, parsing or compiling a spec.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read spec file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse spec document: {0}")]
    Parse(String),

    #[error("OpenAPI spec validation failed, {} issue(s) found:\n{}", .issues.len(), format_issues(.issues))]
    Invalid { issues: Vec<SpecIssue> },

    #[error("failed to compile schema for operation '{operation_id}': {message}")]
    Schema {
        operation_id: String,
        message: String,
    },

    #[error("failed to compile route '{path}': {message}")]
    Route { path: String, message: String },
}

fn format_issues(issues: &[SpecIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("  {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl SpecError {
    /// Convert a list of collected issues into a result, logging every issue.
    pub fn check(issues: Vec<SpecIssue>) -> Result<(), SpecError> {
        if issues.is_empty() {
            return Ok(());
        }
        for issue in &issues {
            tracing::error!(
                location = %issue.location,
                kind = %issue.kind,
                message = %issue.message,
                "OpenAPI spec issue"
            );
        }
        Err(SpecError::Invalid { issues })
    }
}

pub type Result<T, E = SpecError> = std::result::Result<T, E>;
