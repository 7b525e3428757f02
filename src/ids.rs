use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const PREFIX: &str = "req_";

/// Request correlation id.
///
/// Either taken verbatim from the caller (an explicit id or the configured
/// request-id header) or generated as `req_<ULID>`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(format!("{PREFIX}{}", ulid::Ulid::new()))
    }

    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(format!("{PREFIX}{id}"))
    }

    /// First non-blank candidate, else a freshly generated id.
    pub fn resolve(explicit: Option<&str>, header_value: Option<&str>) -> Self {
        explicit
            .into_iter()
            .chain(header_value)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ULID inside a generated id.
    pub fn ulid(&self) -> Option<ulid::Ulid> {
        self.0
            .strip_prefix(PREFIX)
            .and_then(|s| ulid::Ulid::from_string(s).ok())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequestId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(s.to_string()))
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(RequestId)
    }
}
