use super::build::build_spec;
use super::types::ApiSpec;
use crate::error::SpecError;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

/// First 16 hex characters of the SHA-256 of the document text.
pub fn spec_fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    format!("{digest:x}").chars().take(16).collect()
}

/// Decode spec text as JSON, falling back to YAML.
pub fn decode_document(content: &str) -> Result<Value, SpecError> {
    match serde_json::from_str::<Value>(content) {
        Ok(v) => Ok(v),
        Err(_) => serde_yaml::from_str::<Value>(content).map_err(|e| SpecError::Parse(e.to_string())),
    }
}

/// Parse an OpenAPI document given as JSON or YAML text.
pub fn parse_spec_str(content: &str) -> Result<ApiSpec, SpecError> {
    let document = decode_document(content)?;
    build_spec(document, spec_fingerprint(content.as_bytes()))
}

/// Load an OpenAPI document from disk. `.yaml`/`.yml` files are read as YAML,
/// everything else as JSON.
pub fn load_spec(file_path: impl AsRef<Path>) -> Result<ApiSpec, SpecError> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)?;
    let is_yaml = matches!(
        file_path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let document: Value = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| SpecError::Parse(e.to_string()))?
    } else {
        serde_json::from_str(&content).map_err(|e| SpecError::Parse(e.to_string()))?
    };

    let spec = build_spec(document, spec_fingerprint(content.as_bytes()))?;
    info!(
        path = %file_path.display(),
        operations = spec.operations.len(),
        fingerprint = %spec.fingerprint,
        "OpenAPI spec loaded"
    );
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = spec_fingerprint(b"openapi: 3.1.0");
        assert_eq!(a.len(), 16);
        assert_eq!(a, spec_fingerprint(b"openapi: 3.1.0"));
        assert_ne!(a, spec_fingerprint(b"openapi: 3.0.0"));
    }

    #[test]
    fn test_decode_accepts_json_and_yaml() {
        assert!(decode_document(r#"{"openapi": "3.1.0"}"#).unwrap().is_object());
        assert!(decode_document("openapi: 3.1.0\npaths: {}\n").unwrap().is_object());
        assert!(decode_document("openapi: [unterminated").is_err());
    }
}
