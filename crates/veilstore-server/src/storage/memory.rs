//! In-memory storage backend
//!
//! Default storage implementation using in-memory collections.
//! Suitable for development and single-instance deployments.
//! Data is lost on restart.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use tracing::info;

use async_trait::async_trait;
use veilstore_core::{AuditEntry, IndexLink};

use super::{LedgerStore, NewAuditEntry, StorageError};

/// In-memory ledger store implementation
#[derive(Debug)]
pub struct MemoryStore {
    /// Insertion-ordered; the vector index is the insertion sequence.
    entries: RwLock<Vec<AuditEntry>>,
    next_entry_id: AtomicI64,
    links: RwLock<HashMap<(String, Vec<u8>), IndexLink>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_entry_id: AtomicI64::new(1),
            links: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn principal_matches(entry: &AuditEntry, principal_id: Option<&str>) -> bool {
    entry.principal_id.as_deref() == principal_id
}

#[async_trait]
impl LedgerStore for MemoryStore {
    // =========================================================================
    // Audit chain
    // =========================================================================

    async fn append_entry(&self, entry: NewAuditEntry) -> Result<AuditEntry, StorageError> {
        let stored = AuditEntry {
            id: self.next_entry_id.fetch_add(1, Ordering::SeqCst),
            principal_id: entry.principal_id,
            payload: entry.payload,
            sequence_hash: entry.sequence_hash,
            prev_hash: entry.prev_hash,
            signature: entry.signature,
            created_at: Utc::now(),
        };

        let mut entries = self.entries.write().unwrap();
        entries.push(stored.clone());
        info!(
            entry_id = stored.id,
            principal = ?stored.principal_id,
            "Appended audit entry"
        );
        Ok(stored)
    }

    async fn last_sequence_hash(
        &self,
        principal_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .rev()
            .find(|e| principal_matches(e, principal_id))
            .map(|e| e.sequence_hash.clone()))
    }

    async fn entries_for_principal(
        &self,
        principal_id: Option<&str>,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| principal_matches(e, principal_id))
            .cloned()
            .collect())
    }

    async fn recent_entries(
        &self,
        principal_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| principal_matches(e, principal_id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Search index
    // =========================================================================

    async fn insert_link(&self, link: IndexLink) -> Result<(), StorageError> {
        let key = (link.owner_id.clone(), link.token.clone());

        let mut links = self.links.write().unwrap();
        if links.contains_key(&key) {
            return Err(StorageError::AlreadyExists(format!(
                "token {} for owner {}",
                hex::encode(&link.token),
                link.owner_id
            )));
        }

        info!(
            owner = %link.owner_id,
            token = %hex::encode(&link.token),
            "Inserted index link"
        );
        links.insert(key, link);
        Ok(())
    }

    async fn get_link(
        &self,
        owner_id: &str,
        token: &[u8],
    ) -> Result<Option<IndexLink>, StorageError> {
        let links = self.links.read().unwrap();
        Ok(links.get(&(owner_id.to_string(), token.to_vec())).cloned())
    }
}

// Add hex encoding for debug output
mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_entry(principal: Option<&str>, hash: &str, prev: Option<&str>) -> NewAuditEntry {
        NewAuditEntry {
            principal_id: principal.map(str::to_owned),
            payload: json!({"action": "test"}),
            sequence_hash: hash.into(),
            prev_hash: prev.map(str::to_owned),
            signature: vec![1, 2, 3],
        }
    }

    fn new_link(owner: &str, token: &[u8], prev: Option<&[u8]>) -> IndexLink {
        IndexLink {
            token: token.to_vec(),
            owner_id: owner.into(),
            posting: vec![0xEE; 8],
            prev_token: prev.map(<[u8]>::to_vec),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_assigns_ascending_ids() {
        let store = MemoryStore::new();

        let first = store.append_entry(new_entry(Some("u1"), "h1", None)).await.unwrap();
        let second = store
            .append_entry(new_entry(Some("u1"), "h2", Some("h1")))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_last_hash_tracks_per_principal_tail() {
        let store = MemoryStore::new();

        store.append_entry(new_entry(Some("u1"), "a1", None)).await.unwrap();
        store.append_entry(new_entry(Some("u2"), "b1", None)).await.unwrap();
        store
            .append_entry(new_entry(Some("u1"), "a2", Some("a1")))
            .await
            .unwrap();

        assert_eq!(store.last_sequence_hash(Some("u1")).await.unwrap(), Some("a2".into()));
        assert_eq!(store.last_sequence_hash(Some("u2")).await.unwrap(), Some("b1".into()));
        assert_eq!(store.last_sequence_hash(Some("u3")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_anonymous_entries_form_their_own_chain() {
        let store = MemoryStore::new();

        store.append_entry(new_entry(None, "n1", None)).await.unwrap();
        store.append_entry(new_entry(Some("u1"), "a1", None)).await.unwrap();

        assert_eq!(store.last_sequence_hash(None).await.unwrap(), Some("n1".into()));
        let chain = store.entries_for_principal(None).await.unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_entries_newest_first_with_paging() {
        let store = MemoryStore::new();

        for i in 1..=5 {
            let prev = if i == 1 { None } else { Some(format!("h{}", i - 1)) };
            store
                .append_entry(new_entry(Some("u1"), &format!("h{}", i), prev.as_deref()))
                .await
                .unwrap();
        }

        let page = store.recent_entries(Some("u1"), 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sequence_hash, "h4");
        assert_eq!(page[1].sequence_hash, "h3");
    }

    #[tokio::test]
    async fn test_duplicate_link_is_rejected_not_overwritten() {
        let store = MemoryStore::new();

        store.insert_link(new_link("o1", b"t1", None)).await.unwrap();
        let mut duplicate = new_link("o1", b"t1", None);
        duplicate.posting = vec![0xFF];

        let result = store.insert_link(duplicate).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        let stored = store.get_link("o1", b"t1").await.unwrap().unwrap();
        assert_eq!(stored.posting, vec![0xEE; 8]);
    }

    #[tokio::test]
    async fn test_same_token_under_different_owners() {
        let store = MemoryStore::new();

        store.insert_link(new_link("o1", b"t1", None)).await.unwrap();
        store.insert_link(new_link("o2", b"t1", None)).await.unwrap();

        assert!(store.get_link("o1", b"t1").await.unwrap().is_some());
        assert!(store.get_link("o2", b"t1").await.unwrap().is_some());
        assert!(store.get_link("o3", b"t1").await.unwrap().is_none());
    }
}
