use super::tree::ITEMS_SEGMENT;
use crate::spec::deref;
use serde_json::Value;
use std::collections::HashSet;

const MAX_DEPTH: usize = 32;

/// Whether a schema node marks its value as sensitive.
///
/// `x-sensitive: true` or `format: password`.
pub fn is_sensitive(schema: &Value) -> bool {
    schema.get("x-sensitive").and_then(Value::as_bool) == Some(true)
        || schema.get("format").and_then(Value::as_str) == Some("password")
}

/// Collect the segment path of every sensitive field in `schema`.
pub fn sensitive_paths(document: &Value, schema: &Value) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk(document, schema, &mut path, 0, &mut HashSet::new(), &mut out);
    out
}

fn walk<'a>(
    document: &'a Value,
    schema: &'a Value,
    path: &mut Vec<String>,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<Vec<String>>,
) {
    if depth > MAX_DEPTH {
        return;
    }
    // A `$ref` already entered on this descent ends the branch.
    let target = schema.get("$ref").and_then(Value::as_str);
    if let Some(target) = target {
        if !seen.insert(target) {
            return;
        }
    }
    if let Some(resolved) = deref(document, schema) {
        walk_resolved(document, resolved, path, depth, seen, out);
    }
    if let Some(target) = target {
        seen.remove(target);
    }
}

fn walk_resolved<'a>(
    document: &'a Value,
    schema: &'a Value,
    path: &mut Vec<String>,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<Vec<String>>,
) {
    if !path.is_empty() && is_sensitive(schema) {
        if !out.contains(path) {
            out.push(path.clone());
        }
        return;
    }

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            path.push(name.clone());
            walk(document, prop, path, depth + 1, seen, out);
            path.pop();
        }
    }
    if let Some(items) = schema.get("items") {
        path.push(ITEMS_SEGMENT.to_string());
        walk(document, items, path, depth + 1, seen, out);
        path.pop();
    }
    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(branches) = schema.get(keyword).and_then(Value::as_array) {
            for branch in branches {
                walk(document, branch, path, depth + 1, seen, out);
            }
        }
    }
}
