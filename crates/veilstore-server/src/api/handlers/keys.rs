//! Public Key Export Handler
//!
//! Serves the server's verification key so auditors can replay a chain
//! dump without trusting this server. Read-only, unauthenticated, and
//! never exposes private material.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use super::documents::AppState;

/// Response carrying the exported verification key
#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    /// SPKI PEM encoding of the RSA public key
    pub public_key_pem: String,

    /// Signature scheme entries are signed under
    pub algorithm: &'static str,
}

/// Export the server's public signing key
///
/// GET /v1/keys/public
pub async fn export_public_key(State(state): State<Arc<AppState>>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key_pem: state.public_key_pem.clone(),
        algorithm: "RSASSA-PSS-SHA256",
    })
}
