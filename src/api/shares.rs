// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sharing endpoints.
//!
//! The sender deposits a copy of an item for another wallet of the same
//! tenant. Shared copies live apart from the sender's own data and are
//! listed from both sides.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::SignedRequest,
    error::{ApiError, ErrorBody},
    models::{DataSavedResponse, NewDataItem, WalletDataItem, WalletList},
    state::AppState,
};

/// Share an item with another wallet. Signed by the sender.
#[utoipa::path(
    post,
    path = "/wallet/{wallet_id}/share/{to_wallet}/data",
    tag = "Shares",
    params(
        ("wallet_id" = String, Path, description = "Sending wallet"),
        ("to_wallet" = String, Path, description = "Recipient wallet")
    ),
    request_body = NewDataItem,
    responses(
        (status = 200, description = "Item shared", body = DataSavedResponse),
        (status = 400, description = "Validation failure", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn share_data_item(
    State(state): State<AppState>,
    Path((wallet_id, to_wallet)): Path<(String, String)>,
    request: SignedRequest,
) -> Result<Json<DataSavedResponse>, ApiError> {
    let created_at = request.authorize(&state, &wallet_id).await?;
    let item: NewDataItem = request.json()?;

    let summary = state
        .store
        .share_data_item(&request.tenant_id, &wallet_id, &to_wallet, item, created_at)
        .await?;

    tracing::info!(
        tenant_id = %request.tenant_id,
        from_wallet = %wallet_id,
        to_wallet = %to_wallet,
        reference_id = %summary.reference_id,
        version_hash = %summary.version_hash,
        "Data item shared"
    );

    Ok(Json(DataSavedResponse::ok("data saved successfully", summary)))
}

/// Items shared with this wallet.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}/shares",
    tag = "Shares",
    params(("wallet_id" = String, Path, description = "Recipient wallet")),
    responses(
        (status = 200, description = "Received shares by reference", body = WalletList),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_shared_items(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    request: SignedRequest,
) -> Result<Json<WalletList>, ApiError> {
    request.authorize(&state, &wallet_id).await?;
    let list = state
        .store
        .list_shared_items(&request.tenant_id, &wallet_id)
        .await?;
    Ok(Json(list))
}

/// Items this wallet has shared with others.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}/shares/sent",
    tag = "Shares",
    params(("wallet_id" = String, Path, description = "Sending wallet")),
    responses(
        (status = 200, description = "Sent shares by reference", body = WalletList),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_sent_shares(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    request: SignedRequest,
) -> Result<Json<WalletList>, ApiError> {
    request.authorize(&state, &wallet_id).await?;
    let list = state
        .store
        .list_sent_shares(&request.tenant_id, &wallet_id)
        .await?;
    Ok(Json(list))
}

/// Fetch an item shared with this wallet.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}/shared/{from_wallet}/{reference_id}/{version}",
    tag = "Shares",
    params(
        ("wallet_id" = String, Path, description = "Recipient wallet"),
        ("from_wallet" = String, Path, description = "Sending wallet"),
        ("reference_id" = String, Path, description = "Logical slot name"),
        ("version" = String, Path, description = "Version hash")
    ),
    responses(
        (status = 200, description = "The shared item", body = WalletDataItem),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Share not found or storage failure", body = ErrorBody)
    )
)]
pub async fn get_shared_data_item(
    State(state): State<AppState>,
    Path((wallet_id, from_wallet, reference_id, version)): Path<(String, String, String, String)>,
    request: SignedRequest,
) -> Result<Json<WalletDataItem>, ApiError> {
    request.authorize(&state, &wallet_id).await?;
    let item = state
        .store
        .get_shared_data_item(
            &request.tenant_id,
            &from_wallet,
            &wallet_id,
            &reference_id,
            &version,
        )
        .await?;
    Ok(Json(item))
}
