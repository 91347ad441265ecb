// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Requests are authorized by signature rather than by session token.
//!
//! ## Auth Flow
//!
//! 1. The client resolves its tenant with `x-api-key`
//! 2. It signs `path|body|timestamp` with the wallet's RSA private key
//! 3. It sends the timestamp in `x-api-timestamp` and the base64 signature
//!    in `x-api-signature`
//! 4. The server:
//!    - resolves the tenant from the API key
//!    - loads the target wallet's public key (or, on wallet creation, takes
//!      it from the body)
//!    - rejects requests older than 10 seconds
//!    - verifies RSASSA-PKCS1-v1_5 / SHA-256 over the exact received bytes
//!
//! ## Security
//!
//! - The freshness window does not stop replay inside the window
//! - Future-dated timestamps are accepted
//! - There is no key revocation: a wallet's key is its identity

pub mod error;
pub mod extractor;
pub mod signature;

pub use error::AuthError;
pub use extractor::{SignedRequest, Tenant, API_KEY_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use signature::{
    decode_public_key, format_timestamp, parse_timestamp, RequestSignature, FRESHNESS_WINDOW_MS,
    TIMESTAMP_FORMAT,
};
