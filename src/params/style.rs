//! OpenAPI `style` / `explode` deserializers.
//!
//! Each function receives the raw serialized form for one parameter and the
//! typed shape of its schema, and produces a [`CoercedValue`]. Arrays coerce
//! every element with the item kind; objects coerce every value with the
//! kind of the matching declared property.

use super::coerce::{coerce, CoercedValue};
use crate::request::QueryParams;
use crate::spec::{ParamShape, SchemaKind};
use std::collections::BTreeMap;

fn split_items(raw: &str, delimiter: char, kind: SchemaKind) -> CoercedValue {
    CoercedValue::Array(
        raw.split(delimiter).map(|item| coerce(item, kind)).collect(),
    )
}

fn array_of(values: impl IntoIterator<Item = impl AsRef<str>>, kind: SchemaKind) -> CoercedValue {
    CoercedValue::Array(
        values
            .into_iter()
            .map(|v| coerce(v.as_ref(), kind))
            .collect(),
    )
}

/// `k,v,k2,v2`; a trailing key without a value is dropped.
fn object_from_alternating(raw: &str, delimiter: char, shape: &ParamShape) -> CoercedValue {
    let parts: Vec<&str> = raw.split(delimiter).collect();
    let map = parts
        .chunks_exact(2)
        .filter(|pair| !pair[0].is_empty())
        .map(|pair| (pair[0].to_string(), coerce(pair[1], shape.property_kind(pair[0]))))
        .collect();
    CoercedValue::Object(map)
}

/// `k=v<delim>k2=v2`
fn object_from_pairs(raw: &str, delimiter: char, shape: &ParamShape) -> CoercedValue {
    let map = raw
        .split(delimiter)
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), coerce(value, shape.property_kind(key))))
        })
        .collect();
    CoercedValue::Object(map)
}

/// `simple`: `a,b,c` / `k,v,k2,v2` / `k=v,k2=v2`
pub fn simple(raw: &str, shape: &ParamShape, explode: bool) -> CoercedValue {
    match shape.kind {
        SchemaKind::Array => split_items(raw, ',', shape.items),
        SchemaKind::Object if explode => object_from_pairs(raw, ',', shape),
        SchemaKind::Object => object_from_alternating(raw, ',', shape),
        kind => coerce(raw, kind),
    }
}

/// `label`: `.a.b.c` (explode) or `.a,b,c`
pub fn label(raw: &str, shape: &ParamShape, explode: bool) -> CoercedValue {
    let body = raw.strip_prefix('.').unwrap_or(raw);
    let delimiter = if explode { '.' } else { ',' };
    match shape.kind {
        SchemaKind::Array => split_items(body, delimiter, shape.items),
        SchemaKind::Object if explode => object_from_pairs(body, '.', shape),
        SchemaKind::Object => object_from_alternating(body, ',', shape),
        kind => coerce(body, kind),
    }
}

/// `matrix`: `;id=5`, `;id=3;id=4` (explode), `;id=3,4`, `;k=v;k2=v2`
/// (explode object) or `;id=k,v,k2,v2`.
pub fn matrix(raw: &str, name: &str, shape: &ParamShape, explode: bool) -> CoercedValue {
    let prefix = format!("{name}=");
    let strip_name = |segment: &'_ str| -> String {
        segment
            .strip_prefix(&prefix)
            .unwrap_or_else(|| segment.strip_prefix(name).unwrap_or(segment))
            .to_string()
    };
    let segments: Vec<&str> = raw.split(';').filter(|s| !s.is_empty()).collect();

    match shape.kind {
        SchemaKind::Array if explode => array_of(segments.iter().map(|s| strip_name(s)), shape.items),
        SchemaKind::Array => {
            let joined = segments.first().map(|s| strip_name(s)).unwrap_or_default();
            split_items(&joined, ',', shape.items)
        }
        SchemaKind::Object if explode => object_from_pairs(&segments.join(";"), ';', shape),
        SchemaKind::Object => {
            let joined = segments.first().map(|s| strip_name(s)).unwrap_or_default();
            object_from_alternating(&joined, ',', shape)
        }
        kind => {
            let value = segments.first().map(|s| strip_name(s)).unwrap_or_default();
            coerce(&value, kind)
        }
    }
}

/// `form` for query parameters. Reads the whole query so repeated keys
/// (exploded arrays) and sibling keys (exploded objects) are available.
///
/// Returns `None` when nothing in the query belongs to the parameter.
pub fn form_query(query: &QueryParams, name: &str, shape: &ParamShape, explode: bool) -> Option<CoercedValue> {
    match shape.kind {
        SchemaKind::Array if explode => {
            let values: Vec<&str> = query.get_all(name).collect();
            if values.is_empty() {
                return None;
            }
            Some(array_of(values, shape.items))
        }
        SchemaKind::Array => query.get(name).map(|raw| split_items(raw, ',', shape.items)),
        SchemaKind::Object if explode => {
            let map: BTreeMap<String, CoercedValue> = shape
                .properties
                .iter()
                .filter_map(|(prop, kind)| Some((prop.clone(), coerce(query.get(prop)?, *kind))))
                .collect();
            if map.is_empty() {
                None
            } else {
                Some(CoercedValue::Object(map))
            }
        }
        SchemaKind::Object => query
            .get(name)
            .map(|raw| object_from_alternating(raw, ',', shape)),
        kind => query.get(name).map(|raw| coerce(raw, kind)),
    }
}

/// `form` for a single serialized value (cookies).
pub fn form_single(raw: &str, shape: &ParamShape) -> CoercedValue {
    match shape.kind {
        SchemaKind::Array => split_items(raw, ',', shape.items),
        SchemaKind::Object => object_from_alternating(raw, ',', shape),
        kind => coerce(raw, kind),
    }
}

/// `spaceDelimited` / `pipeDelimited`: arrays only; anything else is coerced whole.
pub fn delimited(raw: &str, delimiter: char, shape: &ParamShape) -> CoercedValue {
    match shape.kind {
        SchemaKind::Array => split_items(raw, delimiter, shape.items),
        kind => coerce(raw, kind),
    }
}

/// `deepObject`: collect `name[prop]=value` keys. `None` when no key matched.
pub fn deep_object(query: &QueryParams, name: &str, shape: &ParamShape) -> Option<CoercedValue> {
    let mut map = BTreeMap::new();
    for (key, value) in query.iter() {
        let Some(prop) = key
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
        else {
            continue;
        };
        if prop.is_empty() || map.contains_key(prop) {
            continue;
        }
        map.insert(prop.to_string(), coerce(value, shape.property_kind(prop)));
    }
    if map.is_empty() {
        None
    } else {
        Some(CoercedValue::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::parse_query;
    use serde_json::json;

    fn array(items: SchemaKind) -> ParamShape {
        ParamShape {
            kind: SchemaKind::Array,
            items,
            properties: BTreeMap::new(),
        }
    }

    fn object(props: &[(&str, SchemaKind)]) -> ParamShape {
        ParamShape {
            kind: SchemaKind::Object,
            items: SchemaKind::Unknown,
            properties: props.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn form_explode_and_simple_arrays_agree() {
        let shape = array(SchemaKind::String);
        let q = parse_query("tag=a&tag=b&tag=c");
        let exploded = form_query(&q, "tag", &shape, true).unwrap();
        assert_eq!(exploded, simple("a,b,c", &shape, false));
        assert_eq!(exploded.into_json(), json!(["a", "b", "c"]));
    }

    #[test]
    fn form_non_explode_splits_one_value() {
        let q = parse_query("ids=1,2,3");
        let out = form_query(&q, "ids", &array(SchemaKind::Integer), false).unwrap();
        assert_eq!(out.into_json(), json!([1, 2, 3]));
        assert!(form_query(&q, "missing", &array(SchemaKind::Integer), false).is_none());
    }

    #[test]
    fn form_explode_object_reads_sibling_keys() {
        let q = parse_query("role=admin&first=Alex&other=x");
        let shape = object(&[("role", SchemaKind::String), ("first", SchemaKind::String), ("age", SchemaKind::Integer)]);
        let out = form_query(&q, "user", &shape, true).unwrap();
        assert_eq!(out.into_json(), json!({"role": "admin", "first": "Alex"}));
        assert!(form_query(&parse_query("x=1"), "user", &shape, true).is_none());
    }

    #[test]
    fn simple_objects() {
        let shape = object(&[("role", SchemaKind::String), ("age", SchemaKind::Integer)]);
        assert_eq!(
            simple("role,admin,age,5", &shape, false).into_json(),
            json!({"role": "admin", "age": 5})
        );
        assert_eq!(
            simple("role=admin,age=5", &shape, true).into_json(),
            json!({"role": "admin", "age": 5})
        );
    }

    #[test]
    fn label_variants() {
        let shape = array(SchemaKind::Integer);
        assert_eq!(label(".3.4.5", &shape, true).into_json(), json!([3, 4, 5]));
        assert_eq!(label(".3,4,5", &shape, false).into_json(), json!([3, 4, 5]));
        let obj = object(&[("r", SchemaKind::Integer)]);
        assert_eq!(label(".r=1.g=2", &obj, true).into_json(), json!({"r": 1, "g": "2"}));
        assert_eq!(label(".7", &ParamShape { kind: SchemaKind::Integer, ..array(SchemaKind::Unknown) }, false)
            .into_json(), json!(7));
    }

    #[test]
    fn matrix_variants() {
        let ints = array(SchemaKind::Integer);
        assert_eq!(matrix(";id=3;id=4", "id", &ints, true).into_json(), json!([3, 4]));
        assert_eq!(matrix(";id=3,4", "id", &ints, false).into_json(), json!([3, 4]));
        let prim = ParamShape { kind: SchemaKind::Integer, ..ints.clone() };
        assert_eq!(matrix(";id=5", "id", &prim, false).into_json(), json!(5));
        let obj = object(&[("r", SchemaKind::Integer)]);
        assert_eq!(matrix(";r=1;g=2", "color", &obj, true).into_json(), json!({"r": 1, "g": "2"}));
        assert_eq!(matrix(";color=r,1,g,2", "color", &obj, false).into_json(), json!({"r": 1, "g": "2"}));
    }

    #[test]
    fn delimited_arrays() {
        let shape = array(SchemaKind::String);
        assert_eq!(delimited("a b", ' ', &shape).into_json(), json!(["a", "b"]));
        assert_eq!(delimited("a|b|c", '|', &shape).into_json(), json!(["a", "b", "c"]));
    }

    #[test]
    fn empty_items_are_kept() {
        let shape = array(SchemaKind::String);
        assert_eq!(simple("a,,b", &shape, false).into_json(), json!(["a", "", "b"]));
        assert_eq!(delimited("a||", '|', &shape).into_json(), json!(["a", "", ""]));
        assert_eq!(form_single("", &shape).into_json(), json!([""]));
    }

    #[test]
    fn deep_object_scans_bracketed_keys() {
        let shape = object(&[("min", SchemaKind::Integer)]);
        let q = parse_query("filter%5Bmin%5D=1&filter[max]=9&filterx=0");
        assert_eq!(deep_object(&q, "filter", &shape).unwrap().into_json(), json!({"min": 1, "max": "9"}));
        assert!(deep_object(&parse_query("other[a]=1"), "filter", &shape).is_none());
    }
}
