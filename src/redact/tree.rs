use serde_json::Value;
use std::collections::BTreeMap;

/// Replacement written over every redacted value.
pub const REDACTED: &str = "[REDACTED]";

/// Path segment meaning "every element of this array".
pub const ITEMS_SEGMENT: &str = "[]";

/// Redaction tree mirroring the shape of a JSON document.
///
/// A node either redacts the whole value it lands on, or descends into
/// named object members (`children`) and/or every array element (`items`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionNode {
    pub redact: bool,
    pub children: BTreeMap<String, RedactionNode>,
    pub items: Option<Box<RedactionNode>>,
}

impl RedactionNode {
    pub fn leaf() -> Self {
        RedactionNode {
            redact: true,
            ..Default::default()
        }
    }

    /// Build a tree from segment paths. `None` when no path is given.
    pub fn from_paths<P, S>(paths: impl IntoIterator<Item = P>) -> Option<Self>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut root = RedactionNode::default();
        let mut any = false;
        for path in paths {
            let segments = path.as_ref();
            if segments.is_empty() {
                continue;
            }
            root.insert(segments);
            any = true;
        }
        any.then_some(root)
    }

    fn insert<S: AsRef<str>>(&mut self, segments: &[S]) {
        // A redacted node hides everything below it
        if self.redact {
            return;
        }
        let Some((head, rest)) = segments.split_first() else {
            *self = RedactionNode::leaf();
            return;
        };
        let child = if head.as_ref() == ITEMS_SEGMENT {
            self.items.get_or_insert_with(Box::default).as_mut()
        } else {
            self.children.entry(head.as_ref().to_string()).or_default()
        };
        child.insert(rest);
    }

    pub fn is_empty(&self) -> bool {
        !self.redact && self.children.is_empty() && self.items.is_none()
    }
}

/// Apply a tree to a value, returning the redacted copy.
pub fn redact_value(value: &Value, node: &RedactionNode) -> Value {
    if node.redact {
        return Value::String(REDACTED.to_string());
    }
    match value {
        Value::Object(map) if !node.children.is_empty() => Value::Object(
            map.iter()
                .map(|(key, child)| {
                    let redacted = match node.children.get(key) {
                        Some(sub) => redact_value(child, sub),
                        None => child.clone(),
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(list) => match &node.items {
            Some(items) => Value::Array(list.iter().map(|v| redact_value(v, items)).collect()),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

/// Remove insignificant whitespace from JSON text without reparsing it.
///
/// Whitespace inside string literals is kept; escapes are honoured.
pub fn compact_json(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    for &b in input {
        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                in_string = true;
                out.push(b);
            }
            _ => out.push(b),
        }
    }
    out
}

/// Produce the loggable form of a body.
///
/// - empty input gives an empty string
/// - input that is not JSON is returned as (lossy) text
/// - without a tree the JSON is only whitespace-compacted, byte for byte
/// - with a tree the parsed value is redacted and serialized compactly
pub fn redact_body(body: &[u8], tree: Option<&RedactionNode>) -> String {
    if body.iter().all(u8::is_ascii_whitespace) {
        return String::new();
    }
    let parsed = match serde_json::from_slice::<Value>(body) {
        Ok(v) => v,
        Err(_) => return String::from_utf8_lossy(body).into_owned(),
    };
    match tree {
        Some(node) if !node.is_empty() => {
            serde_json::to_string(&redact_value(&parsed, node)).unwrap_or_default()
        }
        _ => String::from_utf8_lossy(&compact_json(body)).into_owned(),
    }
}
