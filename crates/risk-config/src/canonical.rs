//! Canonical JSON hashing for content-addressed identity.
//!
//! Wherever a hash is used for identity or audit, the input is serialized
//! with keys sorted lexicographically and no superfluous whitespace, then
//! hashed with SHA-256 and hex-encoded. This is the single implementation of
//! that rule; every call site in the workspace goes through here so two
//! processes always produce byte-identical hashes for the same logical
//! content.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonicalize a JSON value by recursively sorting object keys and emitting
/// compact (no whitespace) JSON.
pub fn canonical_json_bytes(v: &Value) -> Vec<u8> {
    let sorted = sort_keys(v);
    serde_json::to_vec(&sorted).expect("canonical json serialization must not fail")
}

pub fn canonical_json_string(v: &Value) -> String {
    String::from_utf8(canonical_json_bytes(v)).expect("canonical json is valid utf8")
}

/// SHA-256 of the canonical JSON encoding of `v`, hex-encoded.
pub fn payload_hash(v: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json_bytes(v));
    hex::encode(hasher.finalize())
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2, "c": {"y": 1, "x": 2}});
        let b = json!({"a": 2, "c": {"x": 2, "y": 1}, "b": 1});
        assert_eq!(payload_hash(&a), payload_hash(&b));
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(payload_hash(&a), payload_hash(&b));
    }

    #[test]
    fn whitespace_in_source_does_not_affect_hash() {
        let a: Value = serde_json::from_str(r#"{"a" : 1, "b": [1,2,3]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b":[1,2,3],"a":1}"#).unwrap();
        assert_eq!(payload_hash(&a), payload_hash(&b));
    }
}
