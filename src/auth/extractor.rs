// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for tenant-scoped and signed requests.
//!
//! Use `SignedRequest` in handlers that act on a wallet:
//!
//! ```rust,ignore
//! async fn add_data(
//!     State(state): State<AppState>,
//!     Path(wallet_id): Path<String>,
//!     request: SignedRequest,
//! ) -> Result<Json<DataSavedResponse>, ApiError> {
//!     let created_at = request.authorize(&state, &wallet_id).await?;
//!     let item: NewDataItem = request.json()?;
//!     // ...
//! }
//! ```
//!
//! `SignedRequest` consumes the body, so it must be the last extractor.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, OriginalUri, Request},
    http::{request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use super::signature::RequestSignature;
use super::AuthError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{keys, StoreError};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const TIMESTAMP_HEADER: &str = "x-api-timestamp";
pub const SIGNATURE_HEADER: &str = "x-api-signature";

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn resolve_tenant(headers: &HeaderMap, state: &AppState) -> Result<String, ApiError> {
    let api_key = header_value(headers, API_KEY_HEADER);
    Ok(state.tenants.get_tenant_id(&api_key).await?)
}

/// Tenant resolved from `x-api-key`, for endpoints without a signature.
pub struct Tenant(pub String);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_tenant(&parts.headers, state).await.map(Tenant)
    }
}

/// A tenant-scoped request with everything needed to check its signature.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub tenant_id: String,
    /// Path exactly as received (before any nesting was stripped).
    pub path: String,
    /// Raw body; empty for GET.
    pub body: String,
    pub timestamp: String,
    pub signature: String,
}

impl FromRequest<AppState> for SignedRequest {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let tenant_id = resolve_tenant(req.headers(), state).await?;
        let timestamp = header_value(req.headers(), TIMESTAMP_HEADER);
        let signature = header_value(req.headers(), SIGNATURE_HEADER);
        let path = req
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::validation("request body is not valid UTF-8"))?;

        Ok(Self {
            tenant_id,
            path,
            body,
            timestamp,
            signature,
        })
    }
}

impl SignedRequest {
    fn signature_parts(&self) -> RequestSignature<'_> {
        RequestSignature {
            path: &self.path,
            body: &self.body,
            timestamp: &self.timestamp,
            signature: &self.signature,
        }
    }

    /// Verify against an explicit public key (used when the key arrives in
    /// the body, as on wallet creation).
    pub fn verify_with(&self, public_key_base64: &str) -> Result<DateTime<Utc>, AuthError> {
        self.signature_parts().verify(public_key_base64, Utc::now())
    }

    /// Verify against the stored key of `wallet_id`.
    ///
    /// An unknown wallet is reported as unauthorized. Returns the
    /// authenticated request time.
    pub async fn authorize(&self, state: &AppState, wallet_id: &str) -> Result<DateTime<Utc>, ApiError> {
        let public_key = wallet_public_key(state, &self.tenant_id, wallet_id).await?;
        Ok(self.verify_with(&public_key)?)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::validation(format!("cannot parse request body: {e}")))
    }
}

async fn wallet_public_key(state: &AppState, tenant_id: &str, wallet_id: &str) -> Result<String, ApiError> {
    let cache_key = keys::wallet_key(tenant_id, wallet_id);
    if let Some(public_key) = state.key_cache.get(&cache_key) {
        return Ok(public_key);
    }

    match state.store.get_wallet(tenant_id, wallet_id).await {
        Ok(wallet) => {
            state.key_cache.put(&cache_key, &wallet.public_key_base64);
            Ok(wallet.public_key_base64)
        }
        Err(StoreError::NotFound(_)) => {
            tracing::debug!(tenant_id, wallet_id, "Signed request for unknown wallet");
            Err(ApiError::unauthorized("unknown wallet"))
        }
        Err(e) => Err(e.into()),
    }
}
