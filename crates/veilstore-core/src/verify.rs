//! Pure audit chain verification
//!
//! Replays a principal's chain from stored data alone: recomputes each
//! entry's hash, checks the PSS signature, and checks the backward link.
//! The walk never aborts early: every divergence in the chain is
//! reported in a single pass so an operator sees the full extent of any
//! tampering at once.
//!
//! This module has no storage or key-loading dependencies; anyone holding
//! the exported public key and a dump of entries can run it.

use serde::Serialize;

use crate::chain::{canonical_payload, link_hash};
use crate::keys::{PublicKey, SignatureRejection};
use crate::types::AuditEntry;

/// The kind of divergence found at one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    /// Recomputed chain hash disagrees with the stored one
    HashMismatch,
    /// Stored signature does not verify against the stored hash
    SignatureInvalid,
    /// Stored back-pointer disagrees with the predecessor's stored hash
    ChainBroken,
}

/// One detected divergence, attributable to a single entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub entry_id: i64,
    pub kind: ViolationKind,

    /// Expected hash, where a hash comparison failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Stored hash that disagreed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// Extra context, e.g. why signature bytes were undecodable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Violation {
    fn hash_mismatch(entry: &AuditEntry, expected: String) -> Self {
        Self {
            entry_id: entry.id,
            kind: ViolationKind::HashMismatch,
            expected: Some(expected),
            actual: Some(entry.sequence_hash.clone()),
            detail: None,
        }
    }

    fn signature_invalid(entry: &AuditEntry, rejection: SignatureRejection) -> Self {
        let detail = match rejection {
            SignatureRejection::Mismatch => None,
            SignatureRejection::Malformed(msg) => Some(msg),
        };
        Self {
            entry_id: entry.id,
            kind: ViolationKind::SignatureInvalid,
            expected: None,
            actual: None,
            detail,
        }
    }

    fn chain_broken(entry: &AuditEntry, expected: Option<&str>) -> Self {
        Self {
            entry_id: entry.id,
            kind: ViolationKind::ChainBroken,
            expected: expected.map(str::to_owned),
            actual: entry.prev_hash.clone(),
            detail: None,
        }
    }
}

/// Verify a full chain, oldest entry first.
///
/// An empty slice is trivially valid. The running expected-predecessor
/// hash always advances to each entry's *stored* hash, so one corrupted
/// entry is flagged exactly once instead of cascading a hash drift into
/// every later entry.
///
/// Signatures were produced with randomized padding; only validity is
/// checked here, never byte equality.
pub fn verify_entries(entries: &[AuditEntry], public_key: &PublicKey) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut expected_prev: Option<String> = None;

    for (i, entry) in entries.iter().enumerate() {
        match canonical_payload(&entry.payload) {
            Ok(canonical) => {
                let computed = link_hash(&canonical, expected_prev.as_deref());
                if computed != entry.sequence_hash {
                    violations.push(Violation::hash_mismatch(entry, computed));
                }
            }
            Err(e) => {
                violations.push(Violation {
                    entry_id: entry.id,
                    kind: ViolationKind::HashMismatch,
                    expected: None,
                    actual: Some(entry.sequence_hash.clone()),
                    detail: Some(e.to_string()),
                });
            }
        }

        if let Err(rejection) =
            public_key.verify(entry.sequence_hash.as_bytes(), &entry.signature)
        {
            violations.push(Violation::signature_invalid(entry, rejection));
        }

        if i > 0 && entry.prev_hash.as_deref() != expected_prev.as_deref() {
            violations.push(Violation::chain_broken(entry, expected_prev.as_deref()));
        }

        expected_prev = Some(entry.sequence_hash.clone());
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SigningKeyPair;
    use crate::types::RequestContext;
    use serde_json::json;

    fn context(n: usize) -> RequestContext {
        RequestContext {
            timestamp: format!("2026-03-01T12:00:0{}Z", n),
            ip: "198.51.100.4".into(),
            user_agent: "test-client".into(),
            path: "/v1/documents".into(),
            method: "POST".into(),
        }
    }

    fn build_chain(keys: &SigningKeyPair, principal: &str, actions: &[&str]) -> Vec<AuditEntry> {
        let mut entries: Vec<AuditEntry> = Vec::new();
        for (i, action) in actions.iter().enumerate() {
            let payload = context(i).into_payload(action, json!({}));
            let canonical = canonical_payload(&payload).unwrap();
            let prev_hash = entries.last().map(|e| e.sequence_hash.clone());
            let sequence_hash = link_hash(&canonical, prev_hash.as_deref());
            let signature = keys.sign(sequence_hash.as_bytes()).unwrap();

            entries.push(AuditEntry {
                id: i as i64 + 1,
                principal_id: Some(principal.into()),
                payload,
                sequence_hash,
                prev_hash,
                signature,
                created_at: chrono::Utc::now(),
            });
        }
        entries
    }

    #[test]
    fn test_empty_chain_is_valid() {
        let keys = SigningKeyPair::generate_with_bits(2048).unwrap();
        assert!(verify_entries(&[], keys.public_key()).is_empty());
    }

    #[test]
    fn test_intact_chain_has_no_violations() {
        let keys = SigningKeyPair::generate_with_bits(2048).unwrap();
        let entries = build_chain(&keys, "u1", &["login", "upload", "download"]);

        assert!(verify_entries(&entries, keys.public_key()).is_empty());
    }

    #[test]
    fn test_single_mutation_yields_single_hash_mismatch() {
        let keys = SigningKeyPair::generate_with_bits(2048).unwrap();
        let mut entries = build_chain(&keys, "u1", &["login", "upload", "download"]);

        entries[1].payload["action"] = json!("delete-everything");

        let violations = verify_entries(&entries, keys.public_key());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::HashMismatch);
        assert_eq!(violations[0].entry_id, 2);
        assert_ne!(violations[0].expected, violations[0].actual);
    }
}
