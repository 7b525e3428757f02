use super::FieldError;
use crate::schema::OutputUnit;

/// Render a JSON pointer as a dotted location under `prefix`.
///
/// `/items/0/name` under `body` becomes `body.items[0].name`.
pub fn pointer_to_location(prefix: &str, pointer: &str) -> String {
    let mut location = prefix.to_string();
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            location.push('[');
            location.push_str(&segment);
            location.push(']');
        } else {
            if !location.is_empty() {
                location.push('.');
            }
            location.push_str(&segment);
        }
    }
    location
}

/// Field name used in fix suggestions: the last property segment of a location.
fn field_name(location: &str) -> &str {
    let tail = location.rsplit('.').next().unwrap_or(location);
    match tail.find('[') {
        Some(0) | None => tail,
        Some(idx) => &tail[..idx],
    }
}

/// Suggested fix for a failed keyword. Unknown keywords have none.
pub fn suggest_fix(keyword: &str, field: &str) -> Option<String> {
    let fix = match keyword {
        "required" => format!("Add the required field '{field}'"),
        "type" => format!("Change '{field}' to the type declared by the schema"),
        "minLength" => format!("Provide a longer value for '{field}'"),
        "maxLength" => format!("Shorten the value of '{field}'"),
        "pattern" => format!("Make '{field}' match the required pattern"),
        "enum" => format!("Use one of the allowed values for '{field}'"),
        "minimum" => format!("Increase '{field}' to at least the minimum allowed value"),
        "maximum" => format!("Decrease '{field}' to at most the maximum allowed value"),
        "minItems" => format!("Add more items to '{field}'"),
        "maxItems" => format!("Remove items from '{field}'"),
        "additionalProperties" => format!("Remove the unexpected field '{field}'"),
        _ => return None,
    };
    Some(fix)
}

/// Flatten an evaluator output tree into field errors under `prefix`.
///
/// Every invalid node carrying an error yields one entry, and children are
/// always visited. `required` and `additionalProperties` report the parent
/// object as their instance location, so the offending property name is
/// appended to reach the actual field.
pub fn flatten_output(unit: &OutputUnit, prefix: &str) -> Vec<FieldError> {
    let mut out = Vec::new();
    flatten_into(unit, prefix, &mut out);
    out
}

fn flatten_into(unit: &OutputUnit, prefix: &str, out: &mut Vec<FieldError>) {
    if !unit.valid {
        if let Some(message) = &unit.error {
            let mut location = pointer_to_location(prefix, &unit.instance_location);
            let keyword = unit.keyword().unwrap_or_default();
            if matches!(keyword, "required" | "additionalProperties") {
                if let Some(property) = &unit.property {
                    if !location.is_empty() {
                        location.push('.');
                    }
                    location.push_str(property);
                }
            }
            let mut error = FieldError::new(&location, message.clone());
            error.fix = suggest_fix(keyword, field_name(&location));
            out.push(error);
        }
    }
    for child in &unit.children {
        flatten_into(child, prefix, out);
    }
}
