//! Digests - SHA-256 fingerprints for generated stylesheets
//!
//! Identical input must give identical digests across runs.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 of bytes as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Canonical JSON (sorted keys, no whitespace)
pub fn canonical_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(&sort_value(value))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Digest of a token document, independent of key order and formatting
pub fn document_digest(document: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(document)?;
    Ok(sha256_hex(canonical_json(&value)?.as_bytes()))
}
