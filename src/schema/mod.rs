//! # Schema Module
//!
//! Cleans OpenAPI schema nodes into JSON Schema 2020-12, compiles one
//! validator per operation body and parameter, and adapts evaluator output
//! into the tree consumed by the error transformer.

mod clean;
mod compile;
mod discriminator;
mod evaluate;

pub use clean::{clean_document, clean_schema, clean_schema_map};
pub use compile::{
    absolutize_refs, CompiledOperation, CompiledParameter, CompiledSpec, SchemaCompiler,
    SPEC_BASE_URI,
};
pub use discriminator::{discriminator_for_request, extract_discriminator, Discriminator};
pub use evaluate::{evaluate, OutputUnit};
