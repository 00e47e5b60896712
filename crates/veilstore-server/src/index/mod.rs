//! Encrypted keyword search index
//!
//! Per-owner chains of opaque token links. The client derives tokens and
//! encrypts postings; the server only stores, links, and walks. A
//! keyword's history is retrieved by walking backward from its newest
//! token, so no single row (and no single query) reveals how many
//! postings a keyword has.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use veilstore_core::IndexLink;

use crate::storage::{LedgerStore, StorageError};
use crate::sync::KeyedLocks;

/// Errors surfaced by index operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// A link with this `(token, owner)` key already exists. The client
    /// violated the protocol: tokens must be fresh per write.
    #[error("duplicate token for owner {owner_id}")]
    DuplicateToken { owner_id: String },

    /// Tokens are client-derived and must be non-empty
    #[error("empty token")]
    EmptyToken,

    /// The storage collaborator failed
    #[error("index persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Appends token links at document ingestion time.
#[derive(Clone)]
pub struct SearchIndexWriter {
    store: Arc<dyn LedgerStore>,
    locks: Arc<KeyedLocks>,
}

impl SearchIndexWriter {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Persist one keyword link for `owner_id`.
    ///
    /// `token` and `prev_token` arrive pre-computed from the client.
    /// Whether `prev_token` resolves is not checked at write time; a
    /// dangling pointer simply ends the walk. A duplicate key is a
    /// conflict, never an overwrite.
    pub async fn append_link(
        &self,
        owner_id: &str,
        token: Vec<u8>,
        posting: Vec<u8>,
        prev_token: Option<Vec<u8>>,
    ) -> Result<(), IndexError> {
        if token.is_empty() {
            return Err(IndexError::EmptyToken);
        }

        // Serialize chain extension per owner; different owners never
        // contend.
        let _guard = self.locks.acquire(owner_id).await;

        let link = IndexLink {
            token,
            owner_id: owner_id.to_string(),
            posting,
            prev_token,
            created_at: chrono::Utc::now(),
        };

        match self.store.insert_link(link).await {
            Ok(()) => {
                info!(owner = %owner_id, "Appended search index link");
                Ok(())
            }
            Err(StorageError::AlreadyExists(_)) => Err(IndexError::DuplicateToken {
                owner_id: owner_id.to_string(),
            }),
            Err(other) => Err(IndexError::Persistence(other)),
        }
    }
}

impl std::fmt::Debug for SearchIndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndexWriter")
            .field("store", &self.store)
            .finish()
    }
}

/// Walks a keyword chain backward from a starting token.
#[derive(Clone)]
pub struct SearchIndexWalker {
    store: Arc<dyn LedgerStore>,
}

impl SearchIndexWalker {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Collect postings newest first, starting at `start_token`.
    ///
    /// Stops at the first token that resolves to nothing (end of chain or
    /// dangling pointer) and at the first repeated token, so a cyclic
    /// chain terminates after its non-repeating prefix. Unknown start
    /// tokens yield an empty result. Performs no mutation; re-running
    /// against unchanged storage yields identical output.
    pub async fn walk(
        &self,
        owner_id: &str,
        start_token: &[u8],
    ) -> Result<Vec<Vec<u8>>, IndexError> {
        let mut visited: std::collections::HashSet<Vec<u8>> = std::collections::HashSet::new();
        let mut postings = Vec::new();
        let mut current = start_token.to_vec();

        while !current.is_empty() && visited.insert(current.clone()) {
            let Some(link) = self.store.get_link(owner_id, &current).await? else {
                break;
            };
            postings.push(link.posting);

            match link.prev_token {
                Some(prev) => current = prev,
                None => break,
            }
        }

        debug!(owner = %owner_id, count = postings.len(), "Walked search chain");
        Ok(postings)
    }
}

impl std::fmt::Debug for SearchIndexWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndexWalker")
            .field("store", &self.store)
            .finish()
    }
}
