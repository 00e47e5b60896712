//! Audit log writer
//!
//! Appends one signed, chained entry per audited action. The read of the
//! principal's chain tail and the insert of the new entry form a critical
//! section guarded by a per-principal lock; appends for different
//! principals run in parallel.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use veilstore_core::{canonical_payload, link_hash, AuditEntry, RequestContext, SigningKeyPair};

use crate::storage::{LedgerStore, NewAuditEntry};
use crate::sync::KeyedLocks;

use super::AuditError;

/// The sole creation path for audit entries.
#[derive(Clone)]
pub struct AuditLogWriter {
    store: Arc<dyn LedgerStore>,
    keys: Arc<SigningKeyPair>,
    locks: Arc<KeyedLocks>,
}

impl AuditLogWriter {
    pub fn new(store: Arc<dyn LedgerStore>, keys: Arc<SigningKeyPair>) -> Self {
        Self {
            store,
            keys,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Append one entry to `principal_id`'s chain.
    ///
    /// `action`, `details`, and the request context are all caller
    /// supplied. The entry is persisted atomically; on error nothing is
    /// visible to readers and the chain tail is unchanged.
    pub async fn append(
        &self,
        principal_id: Option<&str>,
        action: &str,
        details: Value,
        ctx: RequestContext,
    ) -> Result<AuditEntry, AuditError> {
        let payload = ctx.into_payload(action, details);
        let canonical = canonical_payload(&payload)?;

        // Tail read and insert must not interleave with another append
        // for the same principal; anonymous entries share one chain.
        let _guard = self.locks.acquire(principal_id.unwrap_or("")).await;

        let prev_hash = self.store.last_sequence_hash(principal_id).await?;
        let sequence_hash = link_hash(&canonical, prev_hash.as_deref());
        let signature = self.keys.sign(sequence_hash.as_bytes())?;

        let entry = self
            .store
            .append_entry(NewAuditEntry {
                principal_id: principal_id.map(str::to_owned),
                payload,
                sequence_hash,
                prev_hash,
                signature,
            })
            .await?;

        info!(
            entry_id = entry.id,
            principal = ?entry.principal_id,
            action = %action,
            "Recorded audit entry"
        );
        Ok(entry)
    }
}

impl std::fmt::Debug for AuditLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogWriter")
            .field("store", &self.store)
            .finish()
    }
}
