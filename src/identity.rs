// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity and content-address derivations.
//!
//! Two one-way functions double as storage addresses:
//!
//! - `walletId = urlsafe_b64(sha256(b64decode(publicKeyBase64)))`
//! - `versionHash = urlsafe_b64(sha256(concat(encryptedChunks)))`
//!
//! Both use the padded URL-safe alphabet, so the values are safe to use as
//! path segments and never contain `/`.

use base64ct::{Base64, Base64Url, Encoding};
use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in bytes.
const DIGEST_LEN: usize = 32;

/// Errors raised while deriving a wallet identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("cannot calculate ID from blank public key")]
    BlankPublicKey,

    #[error("public key is not valid base64")]
    InvalidPublicKeyEncoding,
}

/// Derive the wallet identifier from a base64-encoded public key.
///
/// The digest covers the raw decoded bytes (the PEM text for the usual
/// clients), not the base64 string itself.
pub fn derive_wallet_id(public_key_base64: &str) -> Result<String, IdentityError> {
    if public_key_base64.is_empty() {
        return Err(IdentityError::BlankPublicKey);
    }
    let raw = Base64::decode_vec(public_key_base64)
        .map_err(|_| IdentityError::InvalidPublicKeyEncoding)?;
    let digest = Sha256::digest(&raw);
    Ok(Base64Url::encode_string(&digest))
}

/// Derive the content address of a data item from its encrypted chunks.
///
/// Chunks are hashed in order as if concatenated, so `["a", "b"]` and
/// `["ab"]` share an address while `["b", "a"]` does not.
pub fn derive_version_hash<S: AsRef<str>>(encrypted_chunks: &[S]) -> String {
    let mut hasher = Sha256::new();
    for chunk in encrypted_chunks {
        hasher.update(chunk.as_ref().as_bytes());
    }
    Base64Url::encode_string(&hasher.finalize())
}

/// Whether `candidate` has the shape of a derived wallet identifier.
pub fn is_wallet_id(candidate: &str) -> bool {
    Base64Url::decode_vec(candidate)
        .map(|bytes| bytes.len() == DIGEST_LEN)
        .unwrap_or(false)
}
