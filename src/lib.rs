//! # zen-validation
//!
//! **zen-validation** validates incoming HTTP requests against an
//! [OpenAPI 3.x](https://spec.openapis.org/oas/v3.1.0) document and turns
//! every violation into an RFC 9457 problem document.
//!
//! ## Overview
//!
//! The document is parsed and compiled once at startup. Each request is then
//! matched to an operation, authenticated, checked for a supported
//! Content-Type, and has its parameters and JSON body validated. The host
//! decides what to do with the outcome: forward a valid request, answer 404
//! for an unmatched one, or serialize the [`problem::Problem`] of an invalid
//! one. A redaction table derived from the same document sanitizes bodies and
//! headers before they are logged.
//!
//! ## Architecture
//!
//! - **[`spec`]** - OpenAPI parsing and operation metadata
//! - **[`schema`]** - OpenAPI-to-JSON-Schema cleaning and validator compilation
//! - **[`router`]** - Exact and templated path matching
//! - **[`params`]** - Parameter extraction by style and type coercion
//! - **[`security`]** - Security requirement evaluation (OR of AND sets)
//! - **[`content`]** - `contentEncoding` / `contentMediaType` checks
//! - **[`validator`]** - The per-request pipeline
//! - **[`problem`]** - Problem documents and evaluator output flattening
//! - **[`redact`]** - Log sanitization for bodies and headers
//! - **[`runtime_config`]** / **[`logging`]** - Environment-driven configuration
//! - **[`cli`]** - The `zen-spec` command-line tool
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host
//!     participant Validator as RequestValidator
//!     participant Router
//!     participant Security
//!     participant Params as Parameter Codec
//!     participant Schema as Compiled Schemas
//!
//!     Host->>Validator: validate(&mut request)
//!     Validator->>Router: match_route(method, path)
//!     alt No route
//!         Validator-->>Host: NoMatch
//!     end
//!     Validator->>Security: validate_security(alternatives)
//!     alt No alternative satisfied
//!         Validator-->>Host: Invalid (401)
//!     end
//!     Validator->>Validator: Content-Type check (415)
//!     Validator->>Params: extract + coerce every parameter
//!     Params->>Schema: evaluate
//!     alt Any parameter invalid
//!         Validator-->>Host: Invalid (400, all errors)
//!     end
//!     Validator->>Schema: evaluate JSON body
//!     Validator-->>Host: Valid(RouteMatch) or Invalid (400)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use zen_validation::{RequestValidator, ValidationOutcome, ValidationRequest};
//! use zen_validation::runtime_config::ValidationConfig;
//!
//! let validator = RequestValidator::from_file("openapi.yaml", ValidationConfig::from_env())?;
//!
//! let mut request = ValidationRequest::new("POST", "/pets?dryRun=true")
//!     .with_header("Content-Type", "application/json")
//!     .with_body(r#"{"name":"Rex"}"#);
//!
//! match validator.validate(&mut request) {
//!     ValidationOutcome::Valid(route) => println!("forward to {}", route.operation_id()),
//!     ValidationOutcome::NoMatch => println!("404"),
//!     ValidationOutcome::Invalid { problem, .. } => println!("{}", problem.to_json()),
//! }
//! # Ok::<(), zen_validation::SpecError>(())
//! ```

pub mod cli;
pub mod content;
pub mod error;
pub mod ids;
pub mod logging;
pub mod params;
pub mod problem;
pub mod redact;
pub mod request;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod security;
pub mod spec;
pub mod validator;

pub use error::{SpecError, SpecIssue};
pub use problem::{FieldError, Problem, ProblemKind};
pub use spec::{
    load_spec, parse_spec_str, ApiSpec, OperationMeta, ParameterLocation, ParameterMeta,
    ParameterStyle, SecurityRequirement, SecurityScheme,
};
pub use validator::{RequestBody, RequestValidator, ValidationOutcome, ValidationRequest};
