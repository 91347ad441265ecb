// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request signature verification.
//!
//! A request is signed by the wallet holder over
//!
//! ```text
//! path + "|" + body + "|" + timestamp
//! ```
//!
//! using RSASSA-PKCS1-v1_5 with SHA-256. The payload is taken byte for byte:
//! no escaping, no normalization. The timestamp bounds request age to
//! [`FRESHNESS_WINDOW_MS`]; it does not prevent replay inside the window.

use base64ct::{Base64, Encoding};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;

use super::AuthError;

/// Wire format of `x-api-timestamp` and of stored `createdAt` values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Maximum accepted request age.
pub const FRESHNESS_WINDOW_MS: i64 = 10_000;

/// Parse a wire timestamp. Returns `None` for anything but the exact format.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let time = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()?
        .and_utc();
    // chrono treats the fractional part as optional when parsing
    (format_timestamp(time) == value).then_some(time)
}

/// Format a time in the wire timestamp format (millisecond precision).
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode a base64-encoded PEM RSA public key.
///
/// The PEM label is not trusted: the DER body is tried as PKCS#1 first and
/// as SubjectPublicKeyInfo second.
pub fn decode_public_key(public_key_base64: &str) -> Result<RsaPublicKey, AuthError> {
    let pem_bytes = Base64::decode_vec(public_key_base64)
        .map_err(|_| AuthError::MalformedKey("public key not base64".to_string()))?;
    let block = pem::parse(&pem_bytes)
        .map_err(|e| AuthError::MalformedKey(format!("cannot pem decode public key: {e}")))?;

    RsaPublicKey::from_pkcs1_der(block.contents())
        .or_else(|_| RsaPublicKey::from_public_key_der(block.contents()))
        .map_err(|e| AuthError::MalformedKey(format!("not an RSA public key: {e}")))
}

/// The signed parts of a request.
#[derive(Debug, Clone, Copy)]
pub struct RequestSignature<'a> {
    /// Request path as received.
    pub path: &'a str,
    /// Raw request body (empty for GET).
    pub body: &'a str,
    /// Claimed `x-api-timestamp`.
    pub timestamp: &'a str,
    /// Base64 `x-api-signature`.
    pub signature: &'a str,
}

impl<'a> RequestSignature<'a> {
    /// Canonical signing payload.
    pub fn signing_payload(&self) -> Vec<u8> {
        format!("{}|{}|{}", self.path, self.body, self.timestamp).into_bytes()
    }

    /// Verify the request against a candidate public key.
    ///
    /// Returns the authenticated request time on success. Checks run in a
    /// fixed order: timestamp, freshness, signature presence, key, signature.
    pub fn verify(
        &self,
        public_key_base64: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, AuthError> {
        let request_time =
            parse_timestamp(self.timestamp).ok_or(AuthError::MissingOrMalformedTimestamp)?;

        let elapsed = now - request_time;
        if elapsed > TimeDelta::milliseconds(FRESHNESS_WINDOW_MS) {
            return Err(AuthError::StaleRequest {
                timestamp: self.timestamp.to_string(),
                elapsed_ms: elapsed.num_milliseconds(),
            });
        }

        if self.signature.is_empty() {
            return Err(AuthError::MissingSignature);
        }

        let public_key = decode_public_key(public_key_base64)?;

        let signature_bytes =
            Base64::decode_vec(self.signature).map_err(|_| AuthError::MalformedSignature)?;
        let signature = Signature::try_from(signature_bytes.as_slice())
            .map_err(|_| AuthError::MalformedSignature)?;

        VerifyingKey::<Sha256>::new(public_key)
            .verify(&self.signing_payload(), &signature)
            .map_err(|_| AuthError::BadSignature)?;

        Ok(request_time)
    }
}
