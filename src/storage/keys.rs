// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage key layout.
//!
//! ## Blob keys
//!
//! ```text
//! data/{tenant}/{wallet}/{reference_id}/{version_hash}
//! shares/{tenant}/{from}/{to}/{reference_id}/{version_hash}
//! ```
//!
//! ## Index partitions
//!
//! ```text
//! {tenant}/{wallet}                  wallet record, data-by-wallet
//! {tenant}/{wallet}/{reference_id}   data-by-reference
//! {tenant}/{to}                      shares-by-recipient
//! {tenant}/{from}                    shares-by-sender
//! ```
//!
//! ## Composite index keys
//!
//! `u32_be(len(partition)) | partition | created_at | u64_be(seq)`
//!
//! The length prefix keeps one partition from being a byte prefix of
//! another. `created_at` is the fixed-width canonical timestamp, so keys sort
//! chronologically inside a partition with `seq` breaking ties in insertion
//! order.

/// Wallet record key, also the data-by-wallet partition.
pub fn wallet_key(tenant_id: &str, wallet_id: &str) -> String {
    format!("{tenant_id}/{wallet_id}")
}

/// Partition holding every version of one reference.
pub fn reference_partition(tenant_id: &str, wallet_id: &str, reference_id: &str) -> String {
    format!("{tenant_id}/{wallet_id}/{reference_id}")
}

/// Partition of a recipient's (or a sender's) shares.
pub fn share_partition(tenant_id: &str, wallet_id: &str) -> String {
    format!("{tenant_id}/{wallet_id}")
}

/// Blob key of an owned data item.
pub fn data_object_key(
    tenant_id: &str,
    wallet_id: &str,
    reference_id: &str,
    version_hash: &str,
) -> String {
    format!("data/{tenant_id}/{wallet_id}/{reference_id}/{version_hash}")
}

/// Blob key of a shared data item.
pub fn share_object_key(
    tenant_id: &str,
    from_wallet: &str,
    to_wallet: &str,
    reference_id: &str,
    version_hash: &str,
) -> String {
    format!("shares/{tenant_id}/{from_wallet}/{to_wallet}/{reference_id}/{version_hash}")
}

// =============================================================================
// Composite Index Keys
// =============================================================================

/// Byte prefix shared by every key of a partition.
pub fn partition_prefix(partition: &str) -> Vec<u8> {
    let len = partition.len() as u32;
    let mut prefix = Vec::with_capacity(4 + partition.len());
    prefix.extend_from_slice(&len.to_be_bytes());
    prefix.extend_from_slice(partition.as_bytes());
    prefix
}

/// Exclusive upper bound of a partition's key range.
///
/// Timestamps are ASCII, so no key of the partition reaches `0xFF` right
/// after the prefix.
pub fn partition_end(partition: &str) -> Vec<u8> {
    let mut end = partition_prefix(partition);
    end.push(0xFF);
    end
}

/// Full composite key of one index entry.
pub fn index_key(partition: &str, created_at: &str, seq: u64) -> Vec<u8> {
    let mut key = partition_prefix(partition);
    key.reserve(created_at.len() + 8);
    key.extend_from_slice(created_at.as_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}
