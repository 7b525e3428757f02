//! # Content Module
//!
//! Leaf validation for `contentEncoding` and `contentMediaType`.
//!
//! JSON Schema 2020-12 treats both keywords as annotations, so the evaluator
//! never checks them. At compile time [`discover_content_rules`] walks a
//! request schema and records every leaf that declares one of them; at
//! request time each rule is checked against the value(s) found at its path
//! by [`resolve_path`].
//!
//! Paths are dotted with an `[]` marker for "every array element":
//! `attachments[].data`. The empty path is the root value.

use crate::spec::deref;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Marker segment for "every element of this array"
pub const ITEMS_MARKER: &str = "[]";

/// Maximum schema depth walked during discovery
const MAX_DISCOVERY_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRule {
    pub path: String,
    pub media_type: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("value is not valid {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },
    #[error("value is not valid JSON: {0}")]
    Json(String),
    #[error("value is not well-formed XML: {0}")]
    Xml(String),
    #[error("decoded value is not valid UTF-8")]
    Utf8,
}

impl ContentError {
    /// Suggested fix for a violation of this kind.
    pub fn fix(&self) -> String {
        match self {
            ContentError::Encoding { encoding, .. } => {
                format!("Provide a valid {encoding}-encoded value")
            }
            ContentError::Json(_) => "Provide a valid JSON document".to_string(),
            ContentError::Xml(_) => "Provide a well-formed XML document".to_string(),
            ContentError::Utf8 => "Encode the content as UTF-8 text".to_string(),
        }
    }
}

/// Decode `value` with `encoding`. Unknown encodings pass through unchanged.
pub fn validate_encoding(value: &str, encoding: &str) -> Result<Vec<u8>, ContentError> {
    let decoded = match encoding.to_ascii_lowercase().as_str() {
        "base64" => STANDARD.decode(value),
        "base64url" => URL_SAFE
            .decode(value)
            .or_else(|_| URL_SAFE_NO_PAD.decode(value)),
        _ => return Ok(value.as_bytes().to_vec()),
    };
    decoded.map_err(|e| ContentError::Encoding {
        encoding: encoding.to_string(),
        reason: e.to_string(),
    })
}

/// Check `content` against `media_type`.
///
/// `application/json` must parse; `application/xml` and `text/xml` must be
/// well-formed. Other media types pass through.
pub fn validate_media_type(content: &[u8], media_type: &str) -> Result<(), ContentError> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/json" => serde_json::from_slice::<serde::de::IgnoredAny>(content)
            .map(|_| ())
            .map_err(|e| ContentError::Json(e.to_string())),
        "application/xml" | "text/xml" => {
            let text = std::str::from_utf8(content).map_err(|_| ContentError::Utf8)?;
            roxmltree::Document::parse(text)
                .map(|_| ())
                .map_err(|e| ContentError::Xml(e.to_string()))
        }
        _ => Ok(()),
    }
}

impl ContentRule {
    /// Check one string value. Encoding is undone before the media type check.
    pub fn check(&self, value: &str) -> Result<(), ContentError> {
        let decoded;
        let content = match &self.encoding {
            Some(encoding) => {
                decoded = validate_encoding(value, encoding)?;
                decoded.as_slice()
            }
            None => value.as_bytes(),
        };
        match &self.media_type {
            Some(media_type) => validate_media_type(content, media_type),
            None => Ok(()),
        }
    }
}

/// Collect every content rule declared in `schema`.
///
/// Walks `properties`, array `items` and every branch of
/// `allOf`/`anyOf`/`oneOf`, following local `$ref`s against `document`.
pub fn discover_content_rules(document: &Value, schema: &Value) -> Vec<ContentRule> {
    let mut rules = Vec::new();
    walk_schema(document, schema, "", 0, &mut HashSet::new(), &mut rules);
    rules
}

/// `seen` holds the `$ref` targets on the current descent; a target that
/// repeats ends the branch.
fn walk_schema<'a>(
    document: &'a Value,
    schema: &'a Value,
    path: &str,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    rules: &mut Vec<ContentRule>,
) {
    if depth > MAX_DISCOVERY_DEPTH {
        return;
    }
    let target = schema.get("$ref").and_then(Value::as_str);
    if let Some(target) = target {
        if !seen.insert(target) {
            return;
        }
    }
    if let Some(resolved) = deref(document, schema) {
        walk_resolved(document, resolved, path, depth, seen, rules);
    }
    if let Some(target) = target {
        seen.remove(target);
    }
}

fn walk_resolved<'a>(
    document: &'a Value,
    schema: &'a Value,
    path: &str,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    rules: &mut Vec<ContentRule>,
) {
    let media_type = schema
        .get("contentMediaType")
        .and_then(Value::as_str)
        .map(str::to_string);
    let encoding = schema
        .get("contentEncoding")
        .and_then(Value::as_str)
        .map(str::to_string);
    if media_type.is_some() || encoding.is_some() {
        let rule = ContentRule {
            path: path.to_string(),
            media_type,
            encoding,
        };
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            let child = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };
            walk_schema(document, prop, &child, depth + 1, seen, rules);
        }
    }
    if let Some(items) = schema.get("items") {
        let child = format!("{path}{ITEMS_MARKER}");
        walk_schema(document, items, &child, depth + 1, seen, rules);
    }
    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(branches) = schema.get(keyword).and_then(Value::as_array) {
            for branch in branches {
                walk_schema(document, branch, path, depth + 1, seen, rules);
            }
        }
    }
}

/// Split a content path into segments: `a.b[].c` → `a`, `b`, `[]`, `c`.
fn path_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let mut rest = part;
        while let Some(start) = rest.find('[') {
            if start > 0 {
                segments.push(&rest[..start]);
            }
            match rest[start..].find(']') {
                Some(end) => {
                    segments.push(&rest[start..start + end + 1]);
                    rest = &rest[start + end + 1..];
                }
                None => {
                    segments.push(&rest[start..]);
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            segments.push(rest);
        }
    }
    segments
}

/// Fetch every value at `path` in `data`, paired with its concrete location.
///
/// `[]` fans out over array elements; `[n]` selects one element. Missing
/// segments yield nothing.
pub fn resolve_path<'a>(data: &'a Value, path: &str) -> Vec<(String, &'a Value)> {
    let mut current: Vec<(String, &Value)> = vec![(String::new(), data)];
    for segment in path_segments(path) {
        let mut next = Vec::new();
        for (loc, value) in current {
            if segment == ITEMS_MARKER {
                if let Some(items) = value.as_array() {
                    for (i, item) in items.iter().enumerate() {
                        next.push((format!("{loc}[{i}]"), item));
                    }
                }
            } else if let Some(index) = segment
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
            {
                let item = index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| value.as_array().and_then(|a| a.get(i)));
                if let Some(item) = item {
                    next.push((format!("{loc}{segment}"), item));
                }
            } else if let Some(child) = value.get(segment) {
                next.push((format!("{loc}.{segment}"), child));
            }
        }
        current = next;
    }
    current
}
