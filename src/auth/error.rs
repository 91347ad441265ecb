// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authentication errors.

/// Failure to authenticate a signed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `x-api-timestamp` absent or not in `YYYY-MM-DDTHH:mm:ss.sssZ` form
    #[error("missing or malformed x-api-timestamp header (format: 2006-01-02T15:04:05.000Z)")]
    MissingOrMalformedTimestamp,

    /// Request older than the freshness window
    #[error("request too late (time={timestamp}, elapsed={elapsed_ms}ms)")]
    StaleRequest { timestamp: String, elapsed_ms: i64 },

    /// `x-api-signature` absent or empty
    #[error("bad signature (empty)")]
    MissingSignature,

    /// Signature is not standard base64
    #[error("signature not base64")]
    MalformedSignature,

    /// Public key could not be decoded as a base64 PEM RSA key
    #[error("malformed public key: {0}")]
    MalformedKey(String),

    /// Signature does not match the payload and key
    #[error("signature verification failed")]
    BadSignature,
}

impl AuthError {
    /// Stable machine-readable code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedTimestamp => "missing_or_malformed_timestamp",
            AuthError::StaleRequest { .. } => "stale_request",
            AuthError::MissingSignature => "missing_signature",
            AuthError::MalformedSignature => "malformed_signature",
            AuthError::MalformedKey(_) => "malformed_key",
            AuthError::BadSignature => "bad_signature",
        }
    }

    /// Whether the request itself is malformed, as opposed to well-formed but
    /// not authorized.
    pub fn is_malformed_request(&self) -> bool {
        match self {
            AuthError::MissingOrMalformedTimestamp
            | AuthError::MissingSignature
            | AuthError::MalformedSignature
            | AuthError::MalformedKey(_) => true,
            AuthError::StaleRequest { .. } | AuthError::BadSignature => false,
        }
    }
}
