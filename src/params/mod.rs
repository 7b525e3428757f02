//! # Params Module
//!
//! Turns raw request strings into typed values the schema evaluator can check.
//!
//! Decoding follows the parameter's `style` and `explode` settings (defaults:
//! `form` for query and cookie, `simple` for path and header; only `form`
//! explodes by default). Every primitive leaf is then coerced to the kind its
//! schema declares. Coercion never fails; a value that does not parse is
//! passed on as a string and rejected by schema validation.

mod coerce;
mod style;

pub use coerce::{coerce, CoercedValue};

use crate::request::QueryParams;
use crate::spec::{ParameterLocation, ParameterMeta, ParameterStyle};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a parameter can be read from, for one request.
///
/// Header names must already be lowercased.
#[derive(Debug, Clone, Copy)]
pub struct ParamSource<'a> {
    pub path: &'a [(Arc<str>, String)],
    pub query: &'a QueryParams,
    pub headers: &'a HashMap<String, String>,
    pub cookies: &'a HashMap<String, String>,
}

impl<'a> ParamSource<'a> {
    fn path_param(&self, name: &str) -> Option<&'a str> {
        self.path
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// The raw serialized string of a parameter, if present.
    ///
    /// For exploded query parameters this is the first occurrence only.
    pub fn raw(&self, param: &ParameterMeta) -> Option<&'a str> {
        match param.location {
            ParameterLocation::Path => self.path_param(&param.name),
            ParameterLocation::Query => self.query.get(&param.name),
            ParameterLocation::Header => self
                .headers
                .get(&param.name.to_ascii_lowercase())
                .map(String::as_str),
            ParameterLocation::Cookie => self.cookies.get(&param.name).map(String::as_str),
        }
    }
}

/// Decode and coerce one parameter. `None` means the parameter is absent.
pub fn extract_parameter(param: &ParameterMeta, source: &ParamSource<'_>) -> Option<CoercedValue> {
    let shape = &param.shape;
    let explode = param.explode();

    if param.location == ParameterLocation::Query {
        return match param.style() {
            ParameterStyle::Form => style::form_query(source.query, &param.name, shape, explode),
            ParameterStyle::DeepObject => style::deep_object(source.query, &param.name, shape),
            ParameterStyle::SpaceDelimited => source
                .query
                .get(&param.name)
                .map(|raw| style::delimited(raw, ' ', shape)),
            ParameterStyle::PipeDelimited => source
                .query
                .get(&param.name)
                .map(|raw| style::delimited(raw, '|', shape)),
            other => source
                .query
                .get(&param.name)
                .map(|raw| decode_single(raw, &param.name, other, param)),
        };
    }

    let raw = source.raw(param)?;
    Some(decode_single(raw, &param.name, param.style(), param))
}

fn decode_single(raw: &str, name: &str, param_style: ParameterStyle, param: &ParameterMeta) -> CoercedValue {
    let shape = &param.shape;
    let explode = param.explode();
    match param_style {
        ParameterStyle::Simple => style::simple(raw, shape, explode),
        ParameterStyle::Label => style::label(raw, shape, explode),
        ParameterStyle::Matrix => style::matrix(raw, name, shape, explode),
        ParameterStyle::SpaceDelimited => style::delimited(raw, ' ', shape),
        ParameterStyle::PipeDelimited => style::delimited(raw, '|', shape),
        // A cookie carries one value, so form reduces to its single-value form
        ParameterStyle::Form | ParameterStyle::DeepObject => style::form_single(raw, shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::parse_query;
    use crate::spec::{ParamShape, SchemaKind};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn meta(name: &str, location: ParameterLocation, kind: SchemaKind, items: SchemaKind) -> ParameterMeta {
        ParameterMeta {
            name: name.into(),
            location,
            required: false,
            schema: None,
            shape: ParamShape {
                kind,
                items,
                properties: BTreeMap::new(),
            },
            style: None,
            explode: None,
            allow_empty_value: false,
            allow_reserved: false,
            sensitive: false,
        }
    }

    struct Fixture {
        path: Vec<(Arc<str>, String)>,
        query: QueryParams,
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
    }

    impl Fixture {
        fn source(&self) -> ParamSource<'_> {
            ParamSource {
                path: &self.path,
                query: &self.query,
                headers: &self.headers,
                cookies: &self.cookies,
            }
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            path: vec![(Arc::from("id"), "42".to_string()), (Arc::from("tags"), "a,b".to_string())],
            query: parse_query("limit=10&tag=x&tag=y"),
            headers: HashMap::from([("x-rate".to_string(), "1.5".to_string())]),
            cookies: HashMap::from([("debug".to_string(), "true".to_string())]),
        }
    }

    #[test]
    fn each_location_uses_its_default_style() {
        let f = fixture();
        let src = f.source();
        let id = meta("id", ParameterLocation::Path, SchemaKind::Integer, SchemaKind::Unknown);
        assert_eq!(extract_parameter(&id, &src), Some(CoercedValue::Integer(42)));

        let tags = meta("tags", ParameterLocation::Path, SchemaKind::Array, SchemaKind::String);
        assert_eq!(extract_parameter(&tags, &src).map(CoercedValue::into_json), Some(json!(["a", "b"])));

        let tag = meta("tag", ParameterLocation::Query, SchemaKind::Array, SchemaKind::String);
        assert_eq!(extract_parameter(&tag, &src).map(CoercedValue::into_json), Some(json!(["x", "y"])));

        let rate = meta("X-Rate", ParameterLocation::Header, SchemaKind::Number, SchemaKind::Unknown);
        assert_eq!(extract_parameter(&rate, &src), Some(CoercedValue::Number(1.5)));

        let debug = meta("debug", ParameterLocation::Cookie, SchemaKind::Boolean, SchemaKind::Unknown);
        assert_eq!(extract_parameter(&debug, &src), Some(CoercedValue::Boolean(true)));
    }

    #[test]
    fn absent_parameters_are_none() {
        let f = fixture();
        let src = f.source();
        let missing = meta("offset", ParameterLocation::Query, SchemaKind::Integer, SchemaKind::Unknown);
        assert_eq!(extract_parameter(&missing, &src), None);
        let header = meta("x-missing", ParameterLocation::Header, SchemaKind::String, SchemaKind::Unknown);
        assert_eq!(extract_parameter(&header, &src), None);
    }

    #[test]
    fn raw_values_are_exposed() {
        let f = fixture();
        let src = f.source();
        let limit = meta("limit", ParameterLocation::Query, SchemaKind::Integer, SchemaKind::Unknown);
        assert_eq!(src.raw(&limit), Some("10"));
    }
}
