//! Data model for the integrity layer
//!
//! Audit entries and search index links are append-only records: neither
//! carries an update or delete path anywhere in this workspace. Binary
//! fields (signatures, tokens, postings) serialize as base64 strings when
//! crossing a JSON boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One tamper-evident audit record.
///
/// `sequence_hash` covers the canonical payload plus the predecessor's
/// hash; `signature` is a randomized PSS signature over the hex hash
/// string's bytes. `created_at` is assigned at insert and is
/// non-decreasing per principal, but chain order is defined by insertion
/// order, never by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Storage-assigned identifier, ascending in insertion order
    pub id: i64,

    /// Acting principal; `None` for anonymous actions
    pub principal_id: Option<String>,

    /// Action metadata, canonicalized before hashing
    pub payload: Value,

    /// Hex SHA-256 chain hash of this entry
    pub sequence_hash: String,

    /// Predecessor's `sequence_hash`; absent at the chain head
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,

    /// PSS signature over `sequence_hash` bytes
    #[serde(with = "serde_bytes_base64")]
    pub signature: Vec<u8>,

    pub created_at: DateTime<Utc>,
}

/// Request metadata recorded alongside an audited action.
///
/// Every field is supplied by the caller; the integrity layer derives
/// nothing itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Caller-supplied timestamp, RFC 3339
    pub timestamp: String,
    /// Originating address
    pub ip: String,
    pub user_agent: String,
    pub path: String,
    pub method: String,
}

impl RequestContext {
    /// Assemble the payload object hashed into the chain.
    ///
    /// Field names are fixed; changing them invalidates every previously
    /// written chain.
    pub fn into_payload(self, action: &str, details: Value) -> Value {
        json!({
            "action": action,
            "details": details,
            "timestamp": self.timestamp,
            "ip": self.ip,
            "user_agent": self.user_agent,
            "path": self.path,
            "method": self.method,
        })
    }
}

/// One posting in an owner's keyword chain.
///
/// The token is derived client-side from (keyword, search key); the
/// server stores and links it without ever learning the keyword. Tokens
/// are unique per owner only; the same token under two owners names two
/// unrelated chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexLink {
    #[serde(with = "serde_bytes_base64")]
    pub token: Vec<u8>,

    pub owner_id: String,

    /// Encrypted posting (ciphertext plus nonce), opaque to the server
    #[serde(with = "serde_bytes_base64")]
    pub posting: Vec<u8>,

    /// Token of the next-older link in the same keyword's chain.
    /// Not resolved at write time; a dangling value simply ends the walk.
    #[serde(
        with = "serde_opt_bytes_base64",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub prev_token: Option<Vec<u8>>,

    pub created_at: DateTime<Utc>,
}

/// Base64 serialization for bytes
mod serde_bytes_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Base64 serialization for optional bytes
mod serde_opt_bytes_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => serializer.serialize_some(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| STANDARD.decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
