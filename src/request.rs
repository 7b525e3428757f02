//! Raw request helpers: query multi-maps, cookies and header normalization.

use std::collections::HashMap;

/// Decoded query string, keeping every occurrence of a repeated key in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        QueryParams { pairs }
    }

    /// All values of `name`, in query order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        QueryParams {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Parse a query string (without the leading `?`), URL-decoding names and values.
pub fn parse_query(query: &str) -> QueryParams {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Split `/users?limit=10` into the path and its decoded query.
pub fn split_path_and_query(raw: &str) -> (&str, QueryParams) {
    match raw.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (raw, QueryParams::default()),
    }
}

/// Lowercase header names so lookups are case-insensitive.
pub fn lowercase_headers<K, V>(headers: impl IntoIterator<Item = (K, V)>) -> HashMap<String, String>
where
    K: AsRef<str>,
    V: Into<String>,
{
    headers
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
        .collect()
}

/// Parse the `cookie` header of a lowercased header map.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name.to_string(), value))
                })
                .collect()
        })
        .unwrap_or_default()
}
