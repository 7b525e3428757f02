use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    /// Prefix used for error locations (`query.limit`, `header.x-trace`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }

    /// Style used when the parameter does not declare one.
    pub fn default_style(&self) -> ParameterStyle {
        match self {
            ParameterLocation::Query | ParameterLocation::Cookie => ParameterStyle::Form,
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "matrix" => Some(ParameterStyle::Matrix),
            "label" => Some(ParameterStyle::Label),
            "form" => Some(ParameterStyle::Form),
            "simple" => Some(ParameterStyle::Simple),
            "spaceDelimited" => Some(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Some(ParameterStyle::PipeDelimited),
            "deepObject" => Some(ParameterStyle::DeepObject),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        };
        f.write_str(s)
    }
}

/// Primitive JSON Schema type of a parameter or one of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    Unknown,
}

impl SchemaKind {
    /// Read the `type` keyword of a schema node.
    ///
    /// A type array (`["integer", "null"]`) yields its first non-null member.
    pub fn of(schema: &Value) -> Self {
        match schema.get("type") {
            Some(Value::String(s)) => Self::from_name(s),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map(Self::from_name)
                .unwrap_or(SchemaKind::Null),
            _ => SchemaKind::Unknown,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "string" => SchemaKind::String,
            "integer" => SchemaKind::Integer,
            "number" => SchemaKind::Number,
            "boolean" => SchemaKind::Boolean,
            "array" => SchemaKind::Array,
            "object" => SchemaKind::Object,
            "null" => SchemaKind::Null,
            _ => SchemaKind::Unknown,
        }
    }
}

/// Typed view of a parameter schema, with `$ref`s already followed.
///
/// The parameter codec only needs the top-level kind, the kind of array
/// items and the kinds of object properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamShape {
    pub kind: SchemaKind,
    pub items: SchemaKind,
    pub properties: BTreeMap<String, SchemaKind>,
}

impl ParamShape {
    pub fn unknown() -> Self {
        ParamShape {
            kind: SchemaKind::Unknown,
            items: SchemaKind::Unknown,
            properties: BTreeMap::new(),
        }
    }

    pub fn property_kind(&self, name: &str) -> SchemaKind {
        self.properties
            .get(name)
            .copied()
            .unwrap_or(SchemaKind::Unknown)
    }
}

#[derive(Debug, Clone)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    /// Raw schema node as written in the document (may contain `$ref`)
    pub schema: Option<Value>,
    pub shape: ParamShape,
    pub style: Option<ParameterStyle>,
    /// `None` when the document does not say; see [`ParameterMeta::explode`]
    pub explode: Option<bool>,
    pub allow_empty_value: bool,
    pub allow_reserved: bool,
    /// `x-sensitive: true`; header values are redacted from logs
    pub sensitive: bool,
}

impl ParameterMeta {
    pub fn style(&self) -> ParameterStyle {
        self.style.unwrap_or_else(|| self.location.default_style())
    }

    /// Only `form` explodes by default.
    pub fn explode(&self) -> bool {
        self.explode
            .unwrap_or(self.style() == ParameterStyle::Form)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
    /// Accepted by the parser, never satisfiable at request time
    Path,
}

/// A `components.securitySchemes` entry.
///
/// Each variant only carries the fields its type defines, so an apiKey
/// scheme with an HTTP scheme name cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityScheme {
    Http {
        /// Lowercased auth scheme (`bearer`, `basic`, ...)
        scheme: String,
        bearer_format: Option<String>,
    },
    ApiKey {
        name: String,
        location: ApiKeyLocation,
    },
    OAuth2,
    OpenIdConnect,
}

impl SecurityScheme {
    pub fn is_bearer(&self) -> bool {
        matches!(self, SecurityScheme::Http { scheme, .. } if scheme == "bearer")
    }

    /// Header that carries this scheme's credential, lowercased.
    pub fn carrier_header(&self) -> Option<String> {
        match self {
            SecurityScheme::Http { .. } | SecurityScheme::OAuth2 | SecurityScheme::OpenIdConnect => {
                Some("authorization".to_string())
            }
            SecurityScheme::ApiKey {
                name,
                location: ApiKeyLocation::Header,
            } => Some(name.to_ascii_lowercase()),
            SecurityScheme::ApiKey { .. } => None,
        }
    }
}

/// One scheme inside a security requirement, with its declared scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredScheme {
    pub name: String,
    /// Recorded, not enforced
    pub scopes: Vec<String>,
}

/// One alternative of a `security` list. All schemes must be satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityRequirement {
    pub schemes: Vec<RequiredScheme>,
}

impl SecurityRequirement {
    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(|s| s.name.as_str())
    }
}

/// One operation of the API, built once at startup.
#[derive(Debug, Clone)]
pub struct OperationMeta {
    pub method: Method,
    pub path_pattern: Arc<str>,
    pub operation_id: String,
    /// `application/json` request schema, untouched (`$ref`s are resolved by the compiler)
    pub request_schema: Option<Value>,
    /// Component name when the request schema is a bare `$ref`
    pub request_schema_name: Option<String>,
    pub request_body_required: bool,
    /// Every media type declared under `requestBody.content`
    pub content_types: Vec<String>,
    pub parameters: Vec<ParameterMeta>,
    /// Alternatives (OR); empty means public
    pub security: Vec<SecurityRequirement>,
    /// `application/json` response schemas by status key (`"200"`, `"default"`, ...)
    pub response_schemas: BTreeMap<String, Value>,
}

impl OperationMeta {
    /// Lookup key `"METHOD PATH"`.
    pub fn key(&self) -> String {
        operation_key(self.method.as_str(), &self.path_pattern)
    }

    pub fn is_templated(&self) -> bool {
        self.path_pattern.contains('{')
    }

    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterMeta> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }
}

pub fn operation_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}

/// The parsed form of an OpenAPI document.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    /// Raw document, kept for `$ref` resolution by the schema compiler
    pub document: Value,
    /// Operations in document order
    pub operations: Vec<Arc<OperationMeta>>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    pub global_security: Vec<SecurityRequirement>,
    /// First 16 hex chars of the SHA-256 of the source text
    pub fingerprint: String,
}

impl ApiSpec {
    pub fn operation(&self, method: &str, path: &str) -> Option<&Arc<OperationMeta>> {
        let key = operation_key(method, path);
        self.operations.iter().find(|op| op.key() == key)
    }

    pub fn operation_by_id(&self, operation_id: &str) -> Option<&Arc<OperationMeta>> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }
}
