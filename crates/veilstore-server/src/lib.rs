//! Integrity Layer Server
//!
//! The service half of the Veilstore cryptographic integrity layer:
//! - Appends hash-chained, server-signed audit entries per principal
//! - Replays and verifies full chains, reporting every divergence
//! - Stores and walks per-owner encrypted keyword search chains
//!
//! Routing, authentication, file streaming, and key exchange between
//! users are collaborators outside this crate; handlers take principal
//! and owner identifiers as explicit request fields.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check
//! - `POST /v1/documents` - Ingest an upload's keyword links + audit it
//! - `POST /v1/audit/append` - Append one audit entry
//! - `GET /v1/audit/logs` - Paginated per-principal log listing
//! - `GET /v1/audit/verify` - Replay and verify a principal's chain
//! - `POST /v1/index/links` - Append keyword links
//! - `POST /v1/search` - Walk a keyword chain, newest first
//! - `GET /v1/keys/public` - Export the verification key (PEM)

pub mod api;
pub mod audit;
pub mod config;
pub mod index;
pub mod storage;
pub mod sync;

pub use api::create_router;
pub use api::handlers::AppState;
pub use audit::{AuditChainVerifier, AuditError, AuditLogWriter, ChainReport};
pub use config::ServerConfig;
pub use index::{IndexError, SearchIndexWalker, SearchIndexWriter};
pub use storage::{LedgerStore, MemoryStore, NewAuditEntry, StorageError};
#[cfg(feature = "postgres")]
pub use storage::PostgresStore;
pub use sync::KeyedLocks;
