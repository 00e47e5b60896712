//! Document Ingestion Handler
//!
//! Entry point for a client that just uploaded an encrypted document:
//! stores the client-computed keyword links and records a signed audit
//! entry for the upload. The audit call is explicit in this handler;
//! its failure is logged and reported in the response rather than
//! rolling back the ingestion.

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::audit::{AuditChainVerifier, AuditLogWriter};
use crate::index::{SearchIndexWalker, SearchIndexWriter};
use crate::storage::LedgerStore;

use super::search::{decode_links, LinkUpload};

/// Application state shared across handlers
pub struct AppState {
    /// The only creation path for audit entries
    pub audit: AuditLogWriter,
    /// Read-only chain replay
    pub verifier: AuditChainVerifier,
    /// Keyword link writer
    pub index: SearchIndexWriter,
    /// Keyword chain walker
    pub search: SearchIndexWalker,
    /// SPKI PEM of the server's verification key
    pub public_key_pem: String,
    /// Backing store, for readiness checks
    pub store: Arc<dyn LedgerStore>,
}

/// Request to ingest one uploaded document's index links
#[derive(Debug, Deserialize)]
pub struct IngestDocumentRequest {
    /// Owner of the document and its keyword chains
    pub owner_id: String,

    /// Client-assigned document id; generated when absent
    pub document_id: Option<String>,

    /// One link per extracted keyword, tokens and postings pre-computed
    /// client-side
    #[serde(default)]
    pub links: Vec<LinkUpload>,
}

/// Response from document ingestion
#[derive(Debug, Serialize)]
pub struct IngestDocumentResponse {
    pub document_id: String,

    /// Number of keyword links persisted
    pub links_indexed: usize,

    /// Id of the audit entry recorded for this upload, when logging
    /// succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_entry_id: Option<i64>,

    /// False when the upload succeeded but the audit append failed
    pub audit_recorded: bool,
}

/// Ingest an uploaded document's keyword links
///
/// POST /v1/documents
pub async fn ingest_document(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(request): Json<IngestDocumentRequest>,
) -> Result<Json<IngestDocumentResponse>, ApiError> {
    if request.owner_id.is_empty() {
        return Err(ApiError::BadRequest("owner_id cannot be empty".into()));
    }

    // Reject undecodable links before writing anything.
    let links = decode_links(&request.links)?;

    let document_id = request
        .document_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    for (token, posting, prev_token) in links {
        state
            .index
            .append_link(&request.owner_id, token, posting, prev_token)
            .await?;
    }

    let links_indexed = request.links.len();
    info!(
        owner = %request.owner_id,
        document_id = %document_id,
        links = links_indexed,
        "Ingested document index links"
    );

    // Explicit audit call; failure must not undo the ingestion.
    let ctx = super::request_context(&method, &uri, &headers);
    let details = json!({
        "document_id": document_id,
        "keywords_indexed": links_indexed,
    });
    let audit_entry_id = match state
        .audit
        .append(Some(&request.owner_id), "upload", details, ctx)
        .await
    {
        Ok(entry) => Some(entry.id),
        Err(e) => {
            warn!(
                owner = %request.owner_id,
                document_id = %document_id,
                error = %e,
                "Failed to record audit entry for upload"
            );
            None
        }
    };

    Ok(Json(IngestDocumentResponse {
        document_id,
        links_indexed,
        audit_recorded: audit_entry_id.is_some(),
        audit_entry_id,
    }))
}
