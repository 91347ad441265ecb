// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests: RSA keys, request signing and state.

use std::sync::OnceLock;

use base64ct::{Base64, Encoding};
use chrono::Utc;
use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};
use rsa::pkcs1v15::SigningKey;
use rsa::rand_core::OsRng;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::auth::{format_timestamp, RequestSignature};
use crate::state::AppState;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_TENANT: &str = "acme";

const TEST_KEY_BITS: usize = 1024;

static TEST_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
static OTHER_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

fn generate() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut OsRng, TEST_KEY_BITS).expect("generate test key")
}

pub fn test_key() -> &'static RsaPrivateKey {
    TEST_KEY.get_or_init(generate)
}

pub fn other_key() -> &'static RsaPrivateKey {
    OTHER_KEY.get_or_init(generate)
}

/// Base64 of the PKCS#1 PEM public key, as clients send it.
pub fn public_key_base64(key: &RsaPrivateKey) -> String {
    let pem = key
        .to_public_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("encode public key");
    Base64::encode_string(pem.as_bytes())
}

/// Base64 signature over `path|body|timestamp`.
pub fn sign(key: &RsaPrivateKey, path: &str, body: &str, timestamp: &str) -> String {
    let payload = RequestSignature {
        path,
        body,
        timestamp,
        signature: "",
    }
    .signing_payload();
    let signing_key = SigningKey::<Sha256>::new(key.clone());
    Base64::encode_string(&signing_key.sign(&payload).to_bytes())
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// In-memory state with `TEST_API_KEY` mapped to `TEST_TENANT`.
pub async fn test_state() -> AppState {
    AppState::in_memory(&[(TEST_API_KEY.to_string(), TEST_TENANT.to_string())])
        .await
        .expect("in-memory state")
}
