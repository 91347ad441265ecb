// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire error envelope.
//!
//! Every failure leaves the service as
//!
//! ```json
//! {"errorType": "VALIDATION", "message": "...", "statusCode": 400}
//! ```
//!
//! with one of three categories. Layer errors convert into [`ApiError`]
//! here and nowhere else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::storage::StoreError;
use crate::tenants::TenantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    Validation,
    Unauthorized,
    Internal,
}

impl ErrorType {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorType::Validation => StatusCode::BAD_REQUEST,
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub error_type: ErrorType,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_type: ErrorType,
    pub message: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.error_type.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error_type: self.error_type,
            message: self.message,
            status_code: status.as_u16(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => ApiError::validation(message),
            StoreError::NotFound(message) => ApiError::internal(message),
            other => {
                tracing::error!(
                    error = %other,
                    retryable = other.is_retryable(),
                    "Wallet store failure"
                );
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(code = err.error_code(), error = %err, "Request authentication failed");
        if err.is_malformed_request() {
            ApiError::validation(err.to_string())
        } else {
            ApiError::unauthorized(err.to_string())
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::MissingApiKey | TenantError::UnknownApiKey => {
                ApiError::unauthorized(err.to_string())
            }
            TenantError::Lookup(ref e) => {
                tracing::error!(error = %e, "Tenant lookup failed");
                ApiError::internal(err.to_string())
            }
        }
    }
}
