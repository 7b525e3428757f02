use super::tree::REDACTED;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Proxy and load-balancer headers left out of request logs entirely.
static INFRASTRUCTURE_HEADERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "forwarded",
        "via",
        "x-forwarded-for",
        "x-forwarded-host",
        "x-forwarded-port",
        "x-forwarded-proto",
        "x-real-ip",
        "x-amzn-trace-id",
        "x-request-start",
        "cf-connecting-ip",
        "cf-ray",
        "true-client-ip",
    ]
    .into_iter()
    .collect()
});

pub fn is_infrastructure_header(name: &str) -> bool {
    INFRASTRUCTURE_HEADERS.contains(name.to_ascii_lowercase().as_str())
}

/// Format headers as `Name: value` lines, sorted by lowercase name.
///
/// Infrastructure headers are dropped; headers in `redact` (lowercased
/// names) have their value replaced.
pub fn format_headers<K, V>(headers: impl IntoIterator<Item = (K, V)>, redact: &HashSet<String>) -> Vec<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut lines: Vec<(String, String)> = headers
        .into_iter()
        .filter_map(|(name, value)| {
            let name = name.as_ref();
            let lower = name.to_ascii_lowercase();
            if INFRASTRUCTURE_HEADERS.contains(lower.as_str()) {
                return None;
            }
            let value = if redact.contains(&lower) {
                REDACTED
            } else {
                value.as_ref()
            };
            Some((lower, format!("{name}: {value}")))
        })
        .collect();
    lines.sort();
    lines.into_iter().map(|(_, line)| line).collect()
}
