//! # Runtime Configuration Module
//!
//! Environment-driven knobs for the request validator.
//!
//! ## Environment Variables
//!
//! ### `ZEN_VALIDATION_ENABLED`
//!
//! `true`/`false` (also `1`/`0`). When disabled, requests are still routed
//! but every matched request is reported valid. Default: `true`.
//!
//! ### `ZEN_VALIDATION_MAX_BODY_BYTES`
//!
//! Largest accepted request body in bytes. Decimal or `0x` hexadecimal.
//! `0` means unlimited. Default: `0`.
//!
//! ### `ZEN_REDACT_HEADERS`
//!
//! Comma-separated header names redacted from logs on every route, in
//! addition to the names derived from the document.
//!
//! ### `ZEN_REQUEST_ID_HEADER`
//!
//! Header consulted for the request correlation id. Default: `x-request-id`.
//!
//! ## Usage
//!
//! ```rust
//! use zen_validation::runtime_config::ValidationConfig;
//!
//! let config = ValidationConfig::from_env();
//! println!("validation enabled: {}", config.enabled);
//! ```

use std::env;

pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub enabled: bool,
    /// `0` = unlimited
    pub max_body_bytes: usize,
    /// Lowercased header names
    pub redact_headers: Vec<String>,
    /// Lowercased header name
    pub request_id_header: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            enabled: true,
            max_body_bytes: 0,
            redact_headers: Vec::new(),
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

impl ValidationConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        ValidationConfig {
            enabled: lookup("ZEN_VALIDATION_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.enabled),
            max_body_bytes: lookup("ZEN_VALIDATION_MAX_BODY_BYTES")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.max_body_bytes),
            redact_headers: lookup("ZEN_REDACT_HEADERS")
                .map(|v| {
                    v.split(',')
                        .map(|h| h.trim().to_ascii_lowercase())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.redact_headers),
            request_id_header: lookup("ZEN_REQUEST_ID_HEADER")
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.request_id_header),
        }
    }

    /// Whether a body of `len` bytes exceeds the configured limit.
    pub fn body_too_large(&self, len: usize) -> bool {
        self.max_body_bytes > 0 && len > self.max_body_bytes
    }
}
