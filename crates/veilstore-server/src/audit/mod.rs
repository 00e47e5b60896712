//! Tamper-evident audit log
//!
//! The writer is the only path that creates entries; the verifier replays
//! a principal's chain against the server's public key. There is no
//! update or delete; a logging mistake is corrected by appending, never
//! by rewriting history.

pub mod verifier;
pub mod writer;

pub use verifier::{AuditChainVerifier, ChainReport};
pub use writer::AuditLogWriter;

use thiserror::Error;

use crate::storage::StorageError;
use veilstore_core::CoreError;

/// Errors surfaced by audit operations.
///
/// Verification findings are *not* errors; they come back as data in
/// [`ChainReport`].
#[derive(Debug, Error)]
pub enum AuditError {
    /// The storage collaborator failed; nothing was written
    #[error("audit persistence failed: {0}")]
    Persistence(#[from] StorageError),

    /// The payload could not be canonicalized or signed
    #[error("audit entry construction failed: {0}")]
    Entry(#[from] CoreError),
}
