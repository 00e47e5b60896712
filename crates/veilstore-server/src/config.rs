//! Server configuration from environment variables

use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,

    /// Primary signing key directory
    pub keys_dir: PathBuf,

    /// Used when the primary directory is not writable
    pub fallback_keys_dir: PathBuf,

    /// PostgreSQL connection string; in-memory storage when unset
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Read configuration from `VEILSTORE_*` environment variables,
    /// falling back to development defaults.
    pub fn from_env() -> Self {
        let port = env::var("VEILSTORE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("VEILSTORE_PORT must be a valid port number");

        let keys_dir = env::var("VEILSTORE_KEYS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("keys"));

        let fallback_keys_dir = env::var("VEILSTORE_FALLBACK_KEYS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("veilstore-keys"));

        let database_url = env::var("VEILSTORE_DATABASE_URL").ok();

        Self {
            port,
            keys_dir,
            fallback_keys_dir,
            database_url,
        }
    }
}
