//! Search Index Handlers
//!
//! Accepts client-computed token links and walks token chains. Tokens
//! and postings are opaque binary values; they cross the API base64
//! encoded and are never interpreted server-side.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;

use super::documents::AppState;

/// Maximum accepted token length in bytes (decoded)
const MAX_TOKEN_BYTES: usize = 64;

/// One client-computed keyword link
#[derive(Debug, Clone, Deserialize)]
pub struct LinkUpload {
    /// Base64 opaque token; primary key within the owner's namespace
    pub token: String,

    /// Base64 encrypted posting (ciphertext plus nonce)
    pub posting: String,

    /// Base64 token of the previous link in this keyword's chain
    #[serde(default)]
    pub prev_token: Option<String>,
}

/// Request to append keyword links outside of document ingestion
#[derive(Debug, Deserialize)]
pub struct AppendLinksRequest {
    pub owner_id: String,
    pub links: Vec<LinkUpload>,
}

/// Response from appending links
#[derive(Debug, Serialize)]
pub struct AppendLinksResponse {
    pub inserted: usize,
}

/// Request to walk one keyword chain
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub owner_id: String,

    /// Base64 token of the newest known link for the keyword
    pub token: String,
}

/// Response from a chain walk
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Base64 encrypted postings, newest first
    pub postings: Vec<String>,
    pub count: usize,
}

/// Decode a batch of uploaded links, rejecting any undecodable field
/// before the caller writes the first one.
pub(crate) fn decode_links(
    links: &[LinkUpload],
) -> Result<Vec<(Vec<u8>, Vec<u8>, Option<Vec<u8>>)>, ApiError> {
    links
        .iter()
        .map(|link| {
            let token = STANDARD.decode(&link.token)?;
            if token.is_empty() {
                return Err(ApiError::BadRequest("Token cannot be empty".into()));
            }
            if token.len() > MAX_TOKEN_BYTES {
                return Err(ApiError::BadRequest(format!(
                    "Token too long: {} bytes (max {})",
                    token.len(),
                    MAX_TOKEN_BYTES
                )));
            }
            let posting = STANDARD.decode(&link.posting)?;
            let prev_token = link
                .prev_token
                .as_deref()
                .map(|p| STANDARD.decode(p))
                .transpose()?;
            Ok((token, posting, prev_token))
        })
        .collect()
}

/// Append keyword links for an owner
///
/// POST /v1/index/links
pub async fn append_index_links(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AppendLinksRequest>,
) -> Result<(StatusCode, Json<AppendLinksResponse>), ApiError> {
    if request.owner_id.is_empty() {
        return Err(ApiError::BadRequest("owner_id cannot be empty".into()));
    }

    let links = decode_links(&request.links)?;
    let inserted = links.len();

    for (token, posting, prev_token) in links {
        state
            .index
            .append_link(&request.owner_id, token, posting, prev_token)
            .await?;
    }

    Ok((StatusCode::CREATED, Json(AppendLinksResponse { inserted })))
}

/// Walk a keyword chain and return its postings, newest first
///
/// POST /v1/search
///
/// The walk is read-only and idempotent; an unknown token simply yields
/// an empty result.
pub async fn search_postings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if request.token.is_empty() {
        return Err(ApiError::BadRequest("Missing token".into()));
    }

    let start_token = STANDARD.decode(&request.token)?;
    let postings = state.search.walk(&request.owner_id, &start_token).await?;

    let postings: Vec<String> = postings.iter().map(|p| STANDARD.encode(p)).collect();
    let count = postings.len();

    Ok(Json(SearchResponse { postings, count }))
}
