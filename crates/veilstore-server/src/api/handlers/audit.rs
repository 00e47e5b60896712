//! Audit Log Handlers
//!
//! Exposes the append path for collaborating services, the paginated log
//! listing, and chain verification. Verification findings are returned
//! as data with HTTP 200: a tampered chain is a successful verification
//! with a non-empty violation list, not a server error.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method, Uri},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::audit::ChainReport;

use super::documents::AppState;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

/// Request to append one audit entry
#[derive(Debug, Deserialize)]
pub struct AppendAuditRequest {
    /// Acting principal; omit for anonymous actions
    pub principal_id: Option<String>,

    pub action: String,

    /// Free-form action metadata
    #[serde(default)]
    pub details: Option<Value>,
}

/// Response from an audit append
#[derive(Debug, Serialize)]
pub struct AppendAuditResponse {
    pub entry_id: i64,
    pub sequence_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing and verification
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub principal_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One listed audit entry
#[derive(Debug, Serialize)]
pub struct AuditLogItem {
    pub id: i64,
    pub entry: Value,
    pub entry_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response from the log listing
#[derive(Debug, Serialize)]
pub struct ListAuditLogsResponse {
    pub count: usize,
    pub logs: Vec<AuditLogItem>,
}

/// Append one audit entry on behalf of a collaborating service
///
/// POST /v1/audit/append
pub async fn append_audit_entry(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(request): Json<AppendAuditRequest>,
) -> Result<Json<AppendAuditResponse>, ApiError> {
    if request.action.is_empty() {
        return Err(ApiError::BadRequest("action cannot be empty".into()));
    }

    let ctx = super::request_context(&method, &uri, &headers);
    let details = request.details.unwrap_or_else(|| Value::Object(Default::default()));

    let entry = state
        .audit
        .append(request.principal_id.as_deref(), &request.action, details, ctx)
        .await?;

    Ok(Json(AppendAuditResponse {
        entry_id: entry.id,
        sequence_hash: entry.sequence_hash,
        prev_hash: entry.prev_hash,
        created_at: entry.created_at,
    }))
}

/// List a principal's audit entries, newest first
///
/// GET /v1/audit/logs?principal_id=&limit=&offset=
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ListAuditLogsResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let entries = state
        .store
        .recent_entries(query.principal_id.as_deref(), limit, offset)
        .await?;

    let logs: Vec<AuditLogItem> = entries
        .into_iter()
        .map(|e| AuditLogItem {
            id: e.id,
            entry: e.payload,
            entry_hash: e.sequence_hash,
            prev_hash: e.prev_hash,
            created_at: e.created_at,
        })
        .collect();

    Ok(Json(ListAuditLogsResponse {
        count: logs.len(),
        logs,
    }))
}

/// Verify a principal's full chain
///
/// GET /v1/audit/verify?principal_id=
///
/// Always enumerates every violation; the response is the complete
/// forensic picture in one call. Signature bytes are never echoed back.
pub async fn verify_audit_chain(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ChainReport>, ApiError> {
    let report = state.verifier.verify(query.principal_id.as_deref()).await?;
    Ok(Json(report))
}
