// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ErrorBody, ErrorType},
    models::{
        DataSavedResponse, NewDataItem, NewWallet, Wallet, WalletDataItem, WalletDataItemList,
        WalletDataItemSummary, WalletList,
    },
    state::AppState,
};

pub mod data;
pub mod health;
pub mod shares;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/wallet", post(wallet::create_wallet))
        .route("/wallet/{wallet_id}", get(wallet::list_data))
        .route("/wallet/{wallet_id}/publickey", get(wallet::get_public_key))
        .route("/wallet/{wallet_id}/data", post(data::add_data_item))
        .route(
            "/wallet/{wallet_id}/data/{reference_id}/history",
            get(data::get_data_item_history),
        )
        .route(
            "/wallet/{wallet_id}/data/{reference_id}/{version}",
            get(data::get_data_item),
        )
        .route(
            "/wallet/{wallet_id}/share/{to_wallet}/data",
            post(shares::share_data_item),
        )
        .route("/wallet/{wallet_id}/shares", get(shares::list_shared_items))
        .route("/wallet/{wallet_id}/shares/sent", get(shares::list_sent_shares))
        .route(
            "/wallet/{wallet_id}/shared/{from_wallet}/{reference_id}/{version}",
            get(shares::get_shared_data_item),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        wallet::create_wallet,
        wallet::get_public_key,
        wallet::list_data,
        data::add_data_item,
        data::get_data_item,
        data::get_data_item_history,
        shares::share_data_item,
        shares::list_shared_items,
        shares::list_sent_shares,
        shares::get_shared_data_item
    ),
    components(
        schemas(
            Wallet,
            NewWallet,
            WalletDataItem,
            NewDataItem,
            WalletDataItemSummary,
            WalletDataItemList,
            WalletList,
            DataSavedResponse,
            ErrorBody,
            ErrorType,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Wallets", description = "Wallet registration and lookup"),
        (name = "Data", description = "Versioned data items"),
        (name = "Shares", description = "Sharing between wallets")
    )
)]
struct ApiDoc;
