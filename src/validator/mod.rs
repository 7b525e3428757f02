//! # Validator Module
//!
//! Per-request entry point. [`RequestValidator::validate`] runs one request
//! through these stages, stopping at the first that fails:
//!
//! 1. **Match**: no route gives [`ValidationOutcome::NoMatch`]; the 404 is
//!    the caller's concern.
//! 2. **Authenticate**: security requirements, 401 on failure.
//! 3. **Content-Type**: checked against the declared media types (with
//!    `type/*` and `*/*`); a missing header is tolerated, a mismatch is 415.
//! 4. **Parameters**: every path, query, header and cookie parameter is
//!    checked and all violations are collected.
//! 5. **Body presence**: a required body that is absent is a 400.
//! 6. **Body schema**: the body is buffered, parsed and validated; the
//!    buffered bytes stay on the request for downstream readers.
//!
//! The validator is built once and shared by reference across threads;
//! every call allocates its own working data.

mod core;

pub use self::core::{content_type_allowed, RequestValidator};

use crate::problem::Problem;
use crate::request::{lowercase_headers, parse_cookies, split_path_and_query, QueryParams};
use crate::router::RouteMatch;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// A request body, buffered on first use.
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Buffered(Vec<u8>),
    Stream(Box<dyn Read + Send>),
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            RequestBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl RequestBody {
    /// Read a streamed body to the end, keeping the bytes.
    ///
    /// With `limit > 0` at most `limit + 1` bytes are read, enough to tell
    /// the body is too large. After a successful buffer the body is
    /// `Buffered` or `Empty`.
    pub fn buffer(&mut self, limit: usize) -> std::io::Result<&[u8]> {
        if let RequestBody::Stream(reader) = self {
            let mut bytes = Vec::new();
            if limit > 0 {
                reader.take(limit as u64 + 1).read_to_end(&mut bytes)?;
            } else {
                reader.read_to_end(&mut bytes)?;
            }
            *self = RequestBody::Buffered(bytes);
        }
        Ok(self.bytes())
    }

    /// Buffered bytes; empty for `Empty` and unread streams.
    pub fn bytes(&self) -> &[u8] {
        match self {
            RequestBody::Buffered(bytes) => bytes,
            RequestBody::Empty | RequestBody::Stream(_) => &[],
        }
    }

    /// A fresh reader over the buffered bytes.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes())
    }

    /// Hand the body on to a downstream consumer.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self {
            RequestBody::Empty => Box::new(std::io::empty()),
            RequestBody::Buffered(bytes) => Box::new(Cursor::new(bytes)),
            RequestBody::Stream(reader) => reader,
        }
    }
}

/// Everything the validator looks at for one request. Header names are
/// lowercased; cookies are parsed from the `cookie` header.
#[derive(Debug, Default)]
pub struct ValidationRequest {
    pub method: String,
    pub path: String,
    pub query: QueryParams,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub body: RequestBody,
    /// Correlation id supplied by the host; wins over the request-id header
    pub request_id: Option<String>,
}

impl ValidationRequest {
    /// `target` may carry a query string (`/pets?limit=5`).
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = split_path_and_query(target);
        ValidationRequest {
            method: method.into(),
            path: path.to_string(),
            query,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let is_cookie = name == "cookie";
        self.headers.insert(name, value.into());
        if is_cookie {
            self.cookies = parse_cookies(&self.headers);
        }
        self
    }

    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.headers.extend(lowercase_headers(headers));
        self.cookies = parse_cookies(&self.headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Buffered(body)
        };
        self
    }

    pub fn with_stream(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = RequestBody::Stream(Box::new(reader));
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Result of validating one request.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid(RouteMatch),
    /// No operation matches; not a validation error
    NoMatch,
    Invalid { route: RouteMatch, problem: Problem },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn problem(&self) -> Option<&Problem> {
        match self {
            ValidationOutcome::Invalid { problem, .. } => Some(problem),
            _ => None,
        }
    }

    pub fn route(&self) -> Option<&RouteMatch> {
        match self {
            ValidationOutcome::Valid(route) | ValidationOutcome::Invalid { route, .. } => Some(route),
            ValidationOutcome::NoMatch => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_normalizes_input() {
        let req = ValidationRequest::new("get", "/pets?limit=5&tag=a&tag=b")
            .with_header("X-Trace", "1")
            .with_header("Cookie", "session=abc");
        assert_eq!(req.path, "/pets");
        assert_eq!(req.query.get("limit"), Some("5"));
        assert_eq!(req.headers.get("x-trace").map(String::as_str), Some("1"));
        assert_eq!(req.cookies.get("session").map(String::as_str), Some("abc"));
    }

    #[test]
    fn streamed_body_is_buffered_and_readable_again() {
        let mut body = RequestBody::Stream(Box::new(Cursor::new(b"{\"a\":1}".to_vec())));
        assert_eq!(body.buffer(0).unwrap(), b"{\"a\":1}");
        let mut again = String::new();
        body.reader().read_to_string(&mut again).unwrap();
        assert_eq!(again, "{\"a\":1}");
        let mut downstream = String::new();
        body.into_reader().read_to_string(&mut downstream).unwrap();
        assert_eq!(downstream, "{\"a\":1}");
    }

    #[test]
    fn buffer_stops_past_the_limit() {
        let mut body = RequestBody::Stream(Box::new(Cursor::new(vec![b'x'; 100])));
        assert_eq!(body.buffer(10).unwrap().len(), 11);
    }
}
