//! Audit chain verifier
//!
//! Read-only replay of a principal's chain. Loads every entry oldest
//! first and hands the slice to the pure verification walk in
//! `veilstore-core`; all divergences come back as data in one report,
//! never as errors and never cut short at the first finding.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use veilstore_core::{verify_entries, PublicKey, Violation};

use crate::storage::LedgerStore;

use super::AuditError;

/// Outcome of verifying one principal's chain
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub valid: bool,
    pub entries_checked: usize,
    pub violations: Vec<Violation>,
}

/// Replays chains against the server's public key.
#[derive(Clone)]
pub struct AuditChainVerifier {
    store: Arc<dyn LedgerStore>,
    public_key: PublicKey,
}

impl AuditChainVerifier {
    pub fn new(store: Arc<dyn LedgerStore>, public_key: PublicKey) -> Self {
        Self { store, public_key }
    }

    /// Verify `principal_id`'s full chain. An empty chain is valid.
    ///
    /// Runs concurrently with appends to other principals without
    /// locking; a concurrent append to the same principal is observed
    /// either fully or not at all.
    pub async fn verify(&self, principal_id: Option<&str>) -> Result<ChainReport, AuditError> {
        let entries = self.store.entries_for_principal(principal_id).await?;
        let violations = verify_entries(&entries, &self.public_key);

        if !violations.is_empty() {
            warn!(
                principal = ?principal_id,
                violation_count = violations.len(),
                "Audit chain verification found violations"
            );
        }

        Ok(ChainReport {
            valid: violations.is_empty(),
            entries_checked: entries.len(),
            violations,
        })
    }
}

impl std::fmt::Debug for AuditChainVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditChainVerifier")
            .field("store", &self.store)
            .finish()
    }
}
