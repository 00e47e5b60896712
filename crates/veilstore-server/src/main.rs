//! Integrity Layer Server Binary
//!
//! Runs the HTTP server for the Veilstore audit log and search index.

use std::env;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use veilstore_core::SigningKeyManager;
use veilstore_server::{
    create_router, AppState, AuditChainVerifier, AuditLogWriter, MemoryStore, SearchIndexWalker,
    SearchIndexWriter, ServerConfig,
};

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("VEILSTORE_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = ServerConfig::from_env();

    // Signing keys are required before any entry can be written; failing
    // to load or create them aborts startup.
    let manager = SigningKeyManager::new(&config.keys_dir, &config.fallback_keys_dir);
    let keys = manager
        .load_or_create()
        .expect("Failed to load or create server signing keys");
    let keys = Arc::new(keys);

    let public_key_pem = keys
        .public_key()
        .to_pem()
        .expect("Failed to encode public key");

    // Initialize storage
    let store: Arc<dyn veilstore_server::LedgerStore> = match &config.database_url {
        #[cfg(feature = "postgres")]
        Some(url) => Arc::new(
            veilstore_server::PostgresStore::new(url)
                .await
                .expect("Failed to connect to PostgreSQL"),
        ),
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            panic!("VEILSTORE_DATABASE_URL is set but this build lacks the 'postgres' feature")
        }
        None => Arc::new(MemoryStore::new()),
    };

    info!(
        port = config.port,
        keys_dir = %config.keys_dir.display(),
        persistent = config.database_url.is_some(),
        "Starting integrity layer server"
    );

    // Create application state
    let state = Arc::new(AppState {
        audit: AuditLogWriter::new(Arc::clone(&store), Arc::clone(&keys)),
        verifier: AuditChainVerifier::new(Arc::clone(&store), keys.public_key().clone()),
        index: SearchIndexWriter::new(Arc::clone(&store)),
        search: SearchIndexWalker::new(Arc::clone(&store)),
        public_key_pem,
        store,
    });

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Integrity layer listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
