//! Property-Based Tests for the Integrity Layer
//!
//! These tests verify the load-bearing properties of the chain layer for
//! arbitrary inputs:
//! 1. Canonicalization is independent of payload construction order
//! 2. The chain hash is reproducible from stored data alone
//! 3. Randomized signatures always verify, never compare equal
//! 4. A chain built through the normal path always verifies clean
//!
//! Uses proptest for property-based testing with arbitrary inputs.

use std::sync::OnceLock;

use proptest::prelude::*;
use serde_json::{json, Value};
use veilstore_core::{
    canonical_payload, link_hash, verify_entries, AuditEntry, RequestContext, SigningKeyPair,
};

/// One shared small-modulus key; generation dominates runtime otherwise.
fn test_keys() -> &'static SigningKeyPair {
    static KEYS: OnceLock<SigningKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| SigningKeyPair::generate_with_bits(2048).unwrap())
}

fn payload_from_pairs(pairs: &[(String, i64)]) -> Value {
    let mut map = serde_json::Map::new();
    for (k, v) in pairs {
        map.insert(k.clone(), json!(v));
    }
    Value::Object(map)
}

// =============================================================================
// Canonicalization
// =============================================================================

proptest! {
    /// Two payloads with the same fields in different insertion orders
    /// must canonicalize to identical bytes.
    #[test]
    fn prop_canonicalization_order_insensitive(
        pairs in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..8),
    ) {
        let forward: Vec<(String, i64)> = pairs.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = canonical_payload(&payload_from_pairs(&forward)).unwrap();
        let b = canonical_payload(&payload_from_pairs(&reversed)).unwrap();

        prop_assert_eq!(a, b);
    }

    /// Canonicalization must be stable across repeated calls.
    #[test]
    fn prop_canonicalization_deterministic(
        keys in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let payload = json!({"details": keys, "action": "upload"});

        prop_assert_eq!(
            canonical_payload(&payload).unwrap(),
            canonical_payload(&payload).unwrap()
        );
    }

    /// Nesting must not defeat key sorting.
    #[test]
    fn prop_nested_objects_sorted(
        inner in prop::collection::btree_map("[a-z]{1,6}", any::<bool>(), 1..5),
    ) {
        let pairs: Vec<(String, bool)> = inner.iter().map(|(k, v)| (k.clone(), *v)).collect();

        let mut fwd = serde_json::Map::new();
        for (k, v) in &pairs {
            fwd.insert(k.clone(), json!(v));
        }
        let mut rev = serde_json::Map::new();
        for (k, v) in pairs.iter().rev() {
            rev.insert(k.clone(), json!(v));
        }

        let a = json!({"details": Value::Object(fwd)});
        let b = json!({"details": Value::Object(rev)});

        prop_assert_eq!(canonical_payload(&a).unwrap(), canonical_payload(&b).unwrap());
    }
}

// =============================================================================
// Chain hashing
// =============================================================================

proptest! {
    /// The hash must be reproducible bit-for-bit from stored inputs.
    #[test]
    fn prop_link_hash_reproducible(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        prev in prop::option::of("[0-9a-f]{64}"),
    ) {
        prop_assert_eq!(
            link_hash(&payload, prev.as_deref()),
            link_hash(&payload, prev.as_deref())
        );
    }

    /// Linking to a different predecessor must change the hash.
    #[test]
    fn prop_link_hash_binds_predecessor(
        payload in prop::collection::vec(any::<u8>(), 0..128),
        prev_a in "[0-9a-f]{64}",
        prev_b in "[0-9a-f]{64}",
    ) {
        prop_assume!(prev_a != prev_b);

        prop_assert_ne!(
            link_hash(&payload, Some(&prev_a)),
            link_hash(&payload, Some(&prev_b))
        );
    }

    /// The head hash (no predecessor) differs from any linked hash.
    #[test]
    fn prop_head_hash_differs_from_linked(
        payload in prop::collection::vec(any::<u8>(), 0..128),
        prev in "[0-9a-f]{64}",
    ) {
        prop_assert_ne!(link_hash(&payload, None), link_hash(&payload, Some(&prev)));
    }
}

// =============================================================================
// Randomized signatures
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Two signatures over the same bytes differ, and both verify.
    #[test]
    fn prop_signatures_randomized_and_valid(
        message in prop::collection::vec(any::<u8>(), 1..128),
    ) {
        let keys = test_keys();
        let first = keys.sign(&message).unwrap();
        let second = keys.sign(&message).unwrap();

        prop_assert_ne!(&first, &second);
        prop_assert!(keys.public_key().verify(&message, &first).is_ok());
        prop_assert!(keys.public_key().verify(&message, &second).is_ok());
    }
}

// =============================================================================
// End-to-end chain property
// =============================================================================

fn build_chain(actions: &[String]) -> Vec<AuditEntry> {
    let keys = test_keys();
    let mut entries: Vec<AuditEntry> = Vec::new();

    for (i, action) in actions.iter().enumerate() {
        let ctx = RequestContext {
            timestamp: format!("2026-03-01T10:{:02}:00Z", i % 60),
            ip: "192.0.2.1".into(),
            user_agent: "prop-client".into(),
            path: "/v1/documents".into(),
            method: "POST".into(),
        };
        let payload = ctx.into_payload(action, json!({"seq": i}));
        let canonical = canonical_payload(&payload).unwrap();
        let prev_hash = entries.last().map(|e| e.sequence_hash.clone());
        let sequence_hash = link_hash(&canonical, prev_hash.as_deref());
        let signature = keys.sign(sequence_hash.as_bytes()).unwrap();

        entries.push(AuditEntry {
            id: i as i64 + 1,
            principal_id: Some("prop-user".into()),
            payload,
            sequence_hash,
            prev_hash,
            signature,
            created_at: chrono::Utc::now(),
        });
    }
    entries
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any chain built through the normal append path verifies clean,
    /// and every entry's back-pointer equals its predecessor's hash.
    #[test]
    fn prop_well_formed_chain_verifies(
        actions in prop::collection::vec("[a-z]{3,10}", 1..6),
    ) {
        let entries = build_chain(&actions);

        prop_assert!(verify_entries(&entries, test_keys().public_key()).is_empty());
        prop_assert!(entries[0].prev_hash.is_none());
        for pair in entries.windows(2) {
            prop_assert_eq!(
                pair[1].prev_hash.as_deref(),
                Some(pair[0].sequence_hash.as_str())
            );
        }
    }
}
