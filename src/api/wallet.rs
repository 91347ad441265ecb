// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet registration and lookup endpoints.
//!
//! A wallet is created by proving possession of the private key that matches
//! the public key in the request body. Its id is derived server-side.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::{SignedRequest, Tenant},
    error::{ApiError, ErrorBody},
    models::{NewWallet, Wallet, WalletList},
    state::AppState,
};

/// Register a wallet.
///
/// The request must be signed with the private key matching
/// `publicKeyBase64`. Registering the same key again overwrites the record.
#[utoipa::path(
    post,
    path = "/wallet",
    tag = "Wallets",
    request_body = NewWallet,
    responses(
        (status = 200, description = "Wallet registered", body = Wallet),
        (status = 400, description = "Malformed request or key", body = ErrorBody),
        (status = 401, description = "Bad signature or unknown API key", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    request: SignedRequest,
) -> Result<Json<Wallet>, ApiError> {
    let new_wallet: NewWallet = request.json()?;
    request.verify_with(&new_wallet.public_key_base64)?;

    let wallet = state
        .store
        .create_wallet(&request.tenant_id, new_wallet)
        .await?;

    tracing::info!(
        tenant_id = %wallet.tenant_id,
        wallet_id = %wallet.wallet_id,
        "Wallet registered"
    );

    Ok(Json(wallet))
}

/// Fetch a wallet's public key.
///
/// Only the API key is required. Any lookup failure, including an unknown
/// wallet, is reported as a validation error.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}/publickey",
    tag = "Wallets",
    params(("wallet_id" = String, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Base64 PEM public key", body = String),
        (status = 400, description = "Unknown wallet", body = ErrorBody),
        (status = 401, description = "Unknown API key", body = ErrorBody)
    )
)]
pub async fn get_public_key(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(wallet_id): Path<String>,
) -> Result<Json<String>, ApiError> {
    let wallet = state
        .store
        .get_wallet(&tenant_id, &wallet_id)
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?;

    Ok(Json(wallet.public_key_base64))
}

/// List summaries of every item the wallet owns, grouped by reference.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}",
    tag = "Wallets",
    params(("wallet_id" = String, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Items grouped by reference", body = WalletList),
        (status = 400, description = "Malformed signature headers", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_data(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    request: SignedRequest,
) -> Result<Json<WalletList>, ApiError> {
    request.authorize(&state, &wallet_id).await?;
    let list = state.store.list_data(&request.tenant_id, &wallet_id).await?;
    Ok(Json(list))
}
