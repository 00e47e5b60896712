//! Storage abstraction for the integrity layer
//!
//! This module provides a trait-based abstraction over the durable store,
//! enabling both in-memory (default) and persistent (PostgreSQL) backends.
//!
//! The store is deliberately narrow: insert-if-absent by primary key,
//! point lookup, and insertion-ordered scans filtered by principal or
//! owner. There is no update or delete: audit entries and index links
//! are immutable once written, and a single append is atomic (readers
//! never observe a partially-written record).

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use veilstore_core::{AuditEntry, IndexLink};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// An audit entry ready for insertion; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub principal_id: Option<String>,
    pub payload: Value,
    pub sequence_hash: String,
    pub prev_hash: Option<String>,
    pub signature: Vec<u8>,
}

/// Durable store for audit chains and search index links.
///
/// Implementations must be thread-safe and support concurrent access.
/// Chain-tail serialization is the caller's job (see the audit writer);
/// the store only guarantees that each individual insert is atomic.
#[async_trait]
pub trait LedgerStore: Send + Sync + Debug {
    // =========================================================================
    // Audit chain
    // =========================================================================

    /// Insert one audit entry. All-or-nothing; returns the stored entry
    /// with its assigned id and timestamp.
    async fn append_entry(&self, entry: NewAuditEntry) -> Result<AuditEntry, StorageError>;

    /// The most recent entry's hash for a principal, by insertion order.
    async fn last_sequence_hash(
        &self,
        principal_id: Option<&str>,
    ) -> Result<Option<String>, StorageError>;

    /// A principal's full chain, oldest first.
    async fn entries_for_principal(
        &self,
        principal_id: Option<&str>,
    ) -> Result<Vec<AuditEntry>, StorageError>;

    /// A page of a principal's entries, newest first.
    async fn recent_entries(
        &self,
        principal_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AuditEntry>, StorageError>;

    // =========================================================================
    // Search index
    // =========================================================================

    /// Insert a link keyed by `(token, owner_id)`. A duplicate key yields
    /// [`StorageError::AlreadyExists`]; nothing is overwritten.
    async fn insert_link(&self, link: IndexLink) -> Result<(), StorageError>;

    /// Point lookup of one link.
    async fn get_link(
        &self,
        owner_id: &str,
        token: &[u8],
    ) -> Result<Option<IndexLink>, StorageError>;
}
