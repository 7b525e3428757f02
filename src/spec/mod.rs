//! # Spec Module
//!
//! Turns an OpenAPI 3.1 document into normalized operations, parameters and
//! security definitions.
//!
//! The document is decoded into generic [`serde_json::Value`] trees rather
//! than a strongly typed model: OpenAPI schemas are semi-structured and the
//! schema compiler needs the raw nodes anyway. Anything malformed is
//! collected as a [`SpecIssue`](crate::error::SpecIssue) and the whole load
//! fails; there is no degraded startup.

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
