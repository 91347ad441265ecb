// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Wallet Models
//!
//! Request and response data structures shared by the store and the REST
//! API. All wire types use camelCase field names and derive `ToSchema` for
//! the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Wallets**: tenant-scoped identities keyed by the hash of their public key
//! - **Data items**: versioned, content-addressed encrypted records
//! - **Responses**: success envelopes for write operations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallets
// =============================================================================

/// A stored wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Tenant the wallet belongs to, resolved from the API key.
    pub tenant_id: String,
    /// URL-safe base64 SHA-256 of the decoded public key.
    pub wallet_id: String,
    /// Base64 of the PEM-encoded RSA public key.
    pub public_key_base64: String,
    /// Client-encrypted private key kept for recovery. Never interpreted.
    pub private_key_encrypted: String,
}

/// Body of a wallet creation request.
///
/// Identifiers are derived server-side; any `tenantId` or `walletId` sent by
/// the client is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewWallet {
    /// Base64 of the PEM-encoded RSA public key.
    pub public_key_base64: String,
    /// Client-encrypted private key.
    #[serde(default)]
    pub private_key_encrypted: String,
}

// =============================================================================
// Data Items
// =============================================================================

/// A versioned data item with its encrypted payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletDataItem {
    /// Caller-chosen logical slot name (e.g. "profile").
    pub reference_id: String,
    /// Ordered ciphertext fragments.
    pub encrypted_chunks: Vec<String>,
    /// Content address of the concatenated chunks.
    pub version_hash: String,
    /// Caller-supplied attestation over the plaintext, passed through.
    pub data_signature: String,
    /// Authenticated request time, `YYYY-MM-DDTHH:mm:ss.sssZ`.
    pub created_at: String,
}

impl WalletDataItem {
    /// The item without its chunk payload.
    pub fn summary(&self) -> WalletDataItemSummary {
        WalletDataItemSummary {
            reference_id: self.reference_id.clone(),
            data_signature: self.data_signature.clone(),
            created_at: self.created_at.clone(),
            version_hash: self.version_hash.clone(),
        }
    }
}

/// Body of an add/share request.
///
/// `versionHash` and `createdAt` are always assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDataItem {
    /// Logical slot name. Required.
    #[serde(default)]
    pub reference_id: String,
    /// Ordered ciphertext fragments.
    #[serde(default)]
    pub encrypted_chunks: Vec<String>,
    /// Caller-supplied attestation over the plaintext.
    #[serde(default)]
    pub data_signature: String,
}

/// A data item without its chunk payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletDataItemSummary {
    pub reference_id: String,
    pub data_signature: String,
    pub created_at: String,
    pub version_hash: String,
}

/// Resolved history of a reference, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WalletDataItemList {
    pub items: Vec<WalletDataItem>,
}

/// Index view of a wallet (or of its shares): reference id → summaries in
/// index order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WalletList {
    pub items: BTreeMap<String, Vec<WalletDataItemSummary>>,
}

impl WalletList {
    /// Append a summary to its reference group.
    pub fn push(&mut self, summary: WalletDataItemSummary) {
        self.items
            .entry(summary.reference_id.clone())
            .or_default()
            .push(summary);
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Success envelope for add/share, carrying the stored item's summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataSavedResponse {
    pub message: String,
    pub status_code: u16,
    #[serde(flatten)]
    pub item: WalletDataItemSummary,
}

impl DataSavedResponse {
    pub fn ok(message: impl Into<String>, item: WalletDataItemSummary) -> Self {
        Self {
            message: message.into(),
            status_code: 200,
            item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_data_item_ignores_server_assigned_fields() {
        let body = r#"{"referenceId":"doc","encryptedChunks":["a","b"],"dataSignature":"sig","versionHash":"forged","createdAt":"2001-01-01T00:00:00.000Z"}"#;
        let item: NewDataItem = serde_json::from_str(body).unwrap();
        assert_eq!(item.reference_id, "doc");
        assert_eq!(item.encrypted_chunks, vec!["a", "b"]);
        assert_eq!(item.data_signature, "sig");
    }

    #[test]
    fn wallet_serializes_camel_case() {
        let wallet = Wallet {
            tenant_id: "t1".to_string(),
            wallet_id: "w1".to_string(),
            public_key_base64: "cGs=".to_string(),
            private_key_encrypted: "secret".to_string(),
        };
        let json = serde_json::to_value(&wallet).unwrap();
        assert_eq!(json["tenantId"], "t1");
        assert_eq!(json["walletId"], "w1");
        assert_eq!(json["publicKeyBase64"], "cGs=");
        assert_eq!(json["privateKeyEncrypted"], "secret");
    }

    #[test]
    fn wallet_list_groups_by_reference() {
        let mut list = WalletList::default();
        for (reference, hash) in [("doc", "h1"), ("profile", "h2"), ("doc", "h3")] {
            list.push(WalletDataItemSummary {
                reference_id: reference.to_string(),
                data_signature: String::new(),
                created_at: String::new(),
                version_hash: hash.to_string(),
            });
        }

        let doc: Vec<_> = list.items["doc"].iter().map(|s| s.version_hash.as_str()).collect();
        assert_eq!(doc, vec!["h1", "h3"]);
        assert_eq!(list.items["profile"].len(), 1);
    }

    #[test]
    fn data_saved_response_flattens_summary() {
        let response = DataSavedResponse::ok(
            "data saved successfully",
            WalletDataItemSummary {
                reference_id: "doc".to_string(),
                data_signature: "sig".to_string(),
                created_at: "2026-01-01T00:00:00.000Z".to_string(),
                version_hash: "hash".to_string(),
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["versionHash"], "hash");
        assert_eq!(json["referenceId"], "doc");
    }

    #[test]
    fn history_list_uses_lowercase_items() {
        let json = serde_json::to_value(WalletDataItemList::default()).unwrap();
        assert!(json.get("items").is_some());
        assert!(json.get("Items").is_none());
    }
}
