// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Versioned data item endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::SignedRequest,
    error::{ApiError, ErrorBody},
    models::{DataSavedResponse, NewDataItem, WalletDataItem, WalletDataItemList},
    state::AppState,
};

/// Path segment that selects the most recent version.
pub const LATEST_VERSION: &str = "latest";

/// Append a new version of a data item.
///
/// `versionHash` and `createdAt` are assigned by the server; `createdAt` is
/// the authenticated request time.
#[utoipa::path(
    post,
    path = "/wallet/{wallet_id}/data",
    tag = "Data",
    params(("wallet_id" = String, Path, description = "Owning wallet")),
    request_body = NewDataItem,
    responses(
        (status = 200, description = "Item stored", body = DataSavedResponse),
        (status = 400, description = "Validation failure", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn add_data_item(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    request: SignedRequest,
) -> Result<Json<DataSavedResponse>, ApiError> {
    let created_at = request.authorize(&state, &wallet_id).await?;
    let item: NewDataItem = request.json()?;

    let summary = state
        .store
        .add_data_item(&request.tenant_id, &wallet_id, item, created_at)
        .await?;

    tracing::info!(
        tenant_id = %request.tenant_id,
        wallet_id = %wallet_id,
        reference_id = %summary.reference_id,
        version_hash = %summary.version_hash,
        "Data item stored"
    );

    Ok(Json(DataSavedResponse::ok("data saved successfully", summary)))
}

/// Fetch one version of a data item, or the newest with `latest`.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}/data/{reference_id}/{version}",
    tag = "Data",
    params(
        ("wallet_id" = String, Path, description = "Owning wallet"),
        ("reference_id" = String, Path, description = "Logical slot name"),
        ("version" = String, Path, description = "Version hash or `latest`")
    ),
    responses(
        (status = 200, description = "The item", body = WalletDataItem),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Item not found or storage failure", body = ErrorBody)
    )
)]
pub async fn get_data_item(
    State(state): State<AppState>,
    Path((wallet_id, reference_id, version)): Path<(String, String, String)>,
    request: SignedRequest,
) -> Result<Json<WalletDataItem>, ApiError> {
    request.authorize(&state, &wallet_id).await?;

    let item = if version == LATEST_VERSION {
        state
            .store
            .get_latest_data_item(&request.tenant_id, &wallet_id, &reference_id)
            .await?
    } else {
        state
            .store
            .get_data_item(&request.tenant_id, &wallet_id, &reference_id, &version)
            .await?
    };

    Ok(Json(item))
}

/// Every version of a data item, oldest first.
#[utoipa::path(
    get,
    path = "/wallet/{wallet_id}/data/{reference_id}/history",
    tag = "Data",
    params(
        ("wallet_id" = String, Path, description = "Owning wallet"),
        ("reference_id" = String, Path, description = "Logical slot name")
    ),
    responses(
        (status = 200, description = "All versions", body = WalletDataItemList),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn get_data_item_history(
    State(state): State<AppState>,
    Path((wallet_id, reference_id)): Path<(String, String)>,
    request: SignedRequest,
) -> Result<Json<WalletDataItemList>, ApiError> {
    request.authorize(&state, &wallet_id).await?;
    let history = state
        .store
        .get_data_item_history(&request.tenant_id, &wallet_id, &reference_id)
        .await?;
    Ok(Json(history))
}
