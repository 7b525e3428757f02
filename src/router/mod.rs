//! # Router Module
//!
//! Path matching from `(method, path)` to an OpenAPI operation.
//!
//! ## Architecture
//!
//! 1. **Compilation**: at startup, exact paths go into a `"METHOD PATH"`
//!    table and templated paths (`/pets/{id}`) are compiled to anchored regex
//!    patterns with their parameter names recorded in order.
//!
//! 2. **Matching**: the exact table is consulted first. Otherwise templates of
//!    the same method are scanned in document order and the first match wins,
//!    with captured segments zipped to parameter names.
//!
//! ## Example
//!
//! ```rust,ignore
//! use zen_validation::router::Router;
//! use zen_validation::spec::load_spec;
//!
//! let spec = load_spec("openapi.yaml")?;
//! let router = Router::from_spec(&spec)?;
//!
//! if let Some(m) = router.match_route("GET", "/pets/123") {
//!     println!("operation: {}", m.operation_id());
//!     println!("id: {:?}", m.get_path_param("id"));
//! }
//! ```

mod core;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
