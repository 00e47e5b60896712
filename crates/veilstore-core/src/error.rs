//! Error types for the Veilstore core layer

use thiserror::Error;

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the core integrity layer
#[derive(Error, Debug)]
pub enum CoreError {
    /// No key storage location is readable/writable
    #[error("key storage failure at {path}: {source}")]
    KeyStorage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored key material exists but cannot be parsed
    #[error("stored key material is not a valid RSA keypair: {0}")]
    KeyFormat(String),

    /// Key generation or signing failure
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Payload canonicalization / serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<rsa::Error> for CoreError {
    fn from(err: rsa::Error) -> Self {
        CoreError::Crypto(err.to_string())
    }
}
