//! # Veilstore Core
//!
//! Cryptographic integrity primitives for the Veilstore encrypted file
//! store: the hash-chained, server-signed audit trail and the opaque
//! token chains backing encrypted keyword search.
//!
//! ## Key Concepts
//!
//! - **Chain hash**: each audit entry's hash covers its canonical payload
//!   plus its predecessor's hash, so silent edits, reordering, or deletion
//!   of history are detectable.
//! - **Signing key**: a server-held RSA-3072 key pair; every entry hash is
//!   signed with randomized PSS padding, and the public half is exportable
//!   so third parties can re-verify a chain dump on their own.
//! - **Index link**: one posting in a per-owner keyword chain, keyed by a
//!   client-derived opaque token. The server never sees plaintext keywords.
//!
//! This crate is pure apart from [`keys`], which owns on-disk key storage.
//! The async service layer lives in `veilstore-server`.

pub mod chain;
pub mod error;
pub mod keys;
pub mod types;
pub mod verify;

pub use chain::{canonical_payload, link_hash};
pub use error::{CoreError, Result};
pub use keys::{PublicKey, SignatureRejection, SigningKeyManager, SigningKeyPair};
pub use types::{AuditEntry, IndexLink, RequestContext};
pub use verify::{verify_entries, Violation, ViolationKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
