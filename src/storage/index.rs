// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backing service abstractions.
//!
//! The wallet store talks to two services:
//!
//! - a [`WalletIndex`]: wallet records plus four time-ordered secondary
//!   indexes holding small JSON records;
//! - a [`BlobStore`]: opaque byte objects addressed by string keys.
//!
//! Both deal in raw bytes. Record encoding belongs to the wallet store.

use std::ops::Bound;

use async_trait::async_trait;

use super::error::{BlobResult, IndexError, IndexResult};
use super::keys;

/// Secondary index tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexTable {
    /// Every data item of a wallet, partitioned by `tenant/wallet`.
    DataByWallet,
    /// Version history, partitioned by `tenant/wallet/reference`.
    DataByReference,
    /// Shares received, partitioned by `tenant/to`.
    SharesByRecipient,
    /// Shares sent, partitioned by `tenant/from`.
    SharesBySender,
}

impl IndexTable {
    pub const ALL: [IndexTable; 4] = [
        IndexTable::DataByWallet,
        IndexTable::DataByReference,
        IndexTable::SharesByRecipient,
        IndexTable::SharesBySender,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndexTable::DataByWallet => "data_by_wallet",
            IndexTable::DataByReference => "data_by_reference",
            IndexTable::SharesByRecipient => "shares_by_recipient",
            IndexTable::SharesBySender => "shares_by_sender",
        }
    }
}

/// One place a record is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub table: IndexTable,
    pub partition: String,
}

impl Posting {
    pub fn new(table: IndexTable, partition: impl Into<String>) -> Self {
        Self {
            table,
            partition: partition.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// Opaque position of the last record returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCursor(pub(crate) Vec<u8>);

/// A bounded scan of one partition.
#[derive(Debug, Clone)]
pub struct IndexQuery<'a> {
    pub table: IndexTable,
    pub partition: &'a str,
    pub order: ScanOrder,
    /// Resume strictly after this position.
    pub after: Option<&'a IndexCursor>,
    pub limit: usize,
}

/// One page of raw records in scan order.
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    pub records: Vec<Vec<u8>>,
    /// Set when the page is full and more records may follow.
    pub next: Option<IndexCursor>,
}

/// Wallet records and time-ordered secondary indexes.
#[async_trait]
pub trait WalletIndex: Send + Sync {
    /// Insert or overwrite the wallet record stored under `key`.
    async fn put_wallet(&self, key: &str, record: Vec<u8>) -> IndexResult<()>;

    async fn get_wallet(&self, key: &str) -> IndexResult<Option<Vec<u8>>>;

    /// File `record` under every posting in one atomic step.
    ///
    /// All postings share one freshly assigned sequence number, which breaks
    /// ties between records with the same `created_at`.
    async fn append(&self, postings: &[Posting], created_at: &str, record: Vec<u8>)
        -> IndexResult<()>;

    async fn query(&self, query: IndexQuery<'_>) -> IndexResult<IndexPage>;
}

/// Opaque object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()>;

    async fn get(&self, key: &str) -> BlobResult<Option<Vec<u8>>>;
}

/// Validate a resume cursor against the partition being scanned.
pub(crate) fn check_cursor(partition: &str, cursor: &IndexCursor) -> IndexResult<()> {
    let prefix = keys::partition_prefix(partition);
    let end = keys::partition_end(partition);
    if cursor.0.len() > prefix.len() && cursor.0.starts_with(&prefix) && cursor.0 < end {
        Ok(())
    } else {
        Err(IndexError::InvalidCursor(partition.to_string()))
    }
}

/// Key bounds of one page scan.
///
/// Ascending scans resume strictly above the cursor, descending scans
/// strictly below it.
pub(crate) fn scan_bounds<'a>(
    order: ScanOrder,
    after: Option<&'a IndexCursor>,
    prefix: &'a [u8],
    end: &'a [u8],
) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    match (order, after) {
        (ScanOrder::Ascending, Some(cursor)) => {
            (Bound::Excluded(cursor.0.as_slice()), Bound::Excluded(end))
        }
        (ScanOrder::Descending, Some(cursor)) => {
            (Bound::Included(prefix), Bound::Excluded(cursor.0.as_slice()))
        }
        (_, None) => (Bound::Included(prefix), Bound::Excluded(end)),
    }
}
