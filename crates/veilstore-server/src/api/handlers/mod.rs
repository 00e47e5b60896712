//! API request handlers

pub mod audit;
pub mod documents;
pub mod keys;
pub mod search;

pub use audit::{
    append_audit_entry, list_audit_logs, verify_audit_chain, AppendAuditRequest,
    AppendAuditResponse, AuditLogItem, AuditLogQuery, ListAuditLogsResponse,
};
pub use documents::{ingest_document, AppState, IngestDocumentRequest, IngestDocumentResponse};
pub use keys::{export_public_key, PublicKeyResponse};
pub use search::{
    append_index_links, search_postings, AppendLinksRequest, AppendLinksResponse, LinkUpload,
    SearchRequest, SearchResponse,
};

use axum::http::{HeaderMap, Method, Uri};
use chrono::Utc;

use veilstore_core::RequestContext;

/// Build the audit request context from the incoming HTTP request.
///
/// The client address honors the first element of `X-Forwarded-For` so
/// entries written behind a proxy attribute the real origin.
pub(crate) fn request_context(method: &Method, uri: &Uri, headers: &HeaderMap) -> RequestContext {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    RequestContext {
        timestamp: Utc::now().to_rfc3339(),
        ip,
        user_agent,
        path: uri.path().to_string(),
        method: method.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.1, 10.0.0.2".parse().unwrap(),
        );
        headers.insert("user-agent", "veilstore-client/2.1".parse().unwrap());

        let uri: Uri = "/v1/documents".parse().unwrap();
        let ctx = request_context(&Method::POST, &uri, &headers);

        assert_eq!(ctx.ip, "203.0.113.7");
        assert_eq!(ctx.user_agent, "veilstore-client/2.1");
        assert_eq!(ctx.path, "/v1/documents");
        assert_eq!(ctx.method, "POST");
    }

    #[test]
    fn test_context_defaults_when_headers_missing() {
        let uri: Uri = "/v1/audit/append".parse().unwrap();
        let ctx = request_context(&Method::POST, &uri, &HeaderMap::new());

        assert_eq!(ctx.ip, "unknown");
        assert_eq!(ctx.user_agent, "unknown");
    }
}
