//! Chain hashing
//!
//! Pure functions binding an audit entry to its predecessor. The stored
//! hash of entry *i* covers the canonical payload bytes of *i* followed by
//! the hex hash of entry *i-1*, so any later edit to an entry, or removal
//! of an entry, breaks every recomputation from that point on.
//!
//! No I/O happens here; the verifier re-runs these functions bit-for-bit
//! from stored data alone.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Serialize a payload to canonical bytes.
///
/// Object keys are sorted recursively before compact JSON encoding, so two
/// logically-equal payloads always canonicalize to identical bytes
/// regardless of construction order.
pub fn canonical_payload(payload: &Value) -> Result<Vec<u8>> {
    let sorted = sort_keys(payload);
    Ok(serde_json::to_vec(&sorted)?)
}

/// Compute the chain hash for one entry.
///
/// SHA-256 over the canonical payload bytes, followed by the previous
/// entry's hex hash when one exists. The chain head hashes the payload
/// alone. Returned lowercase hex.
pub fn link_hash(canonical: &[u8], prev_hash: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical);
    if let Some(prev) = prev_hash {
        hasher.update(prev.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, val) in entries {
                sorted.insert(key.clone(), sort_keys(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_ignores_key_order() {
        let a = json!({"b": 1, "a": 2, "c": {"z": true, "y": false}});
        let b = json!({"c": {"y": false, "z": true}, "a": 2, "b": 1});

        assert_eq!(
            canonical_payload(&a).unwrap(),
            canonical_payload(&b).unwrap()
        );
    }

    #[test]
    fn test_canonical_sorts_nested_arrays_of_objects() {
        let v = json!({"items": [{"b": 1, "a": 2}, {"d": 3, "c": 4}]});
        let bytes = canonical_payload(&v).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"items":[{"a":2,"b":1},{"c":4,"d":3}]}"#
        );
    }

    #[test]
    fn test_canonical_preserves_array_order() {
        let a = json!({"items": [1, 2, 3]});
        let b = json!({"items": [3, 2, 1]});

        assert_ne!(
            canonical_payload(&a).unwrap(),
            canonical_payload(&b).unwrap()
        );
    }

    #[test]
    fn test_link_hash_is_hex_sha256() {
        let hash = link_hash(b"payload", None);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_link_hash_depends_on_predecessor() {
        let head = link_hash(b"payload", None);
        let linked = link_hash(b"payload", Some(&head));
        let relinked = link_hash(b"payload", Some(&linked));

        assert_ne!(head, linked);
        assert_ne!(linked, relinked);
    }

    #[test]
    fn test_link_hash_deterministic() {
        let prev = link_hash(b"first", None);
        assert_eq!(
            link_hash(b"second", Some(&prev)),
            link_hash(b"second", Some(&prev))
        );
    }
}
