// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet index backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: `tenant/wallet` → serialized wallet record
//! - `data_by_wallet`, `data_by_reference`, `shares_by_recipient`,
//!   `shares_by_sender`: composite key (see [`super::keys`]) → record
//! - `api_keys`: API key → serialized tenant record
//! - `index_meta`: counters (`next_seq`)

use std::path::Path;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::error::IndexResult;
use super::index::{
    check_cursor, scan_bounds, IndexCursor, IndexPage, IndexQuery, IndexTable, Posting,
    ScanOrder, WalletIndex,
};
use super::keys;
use crate::tenants::{TenantDirectory, TenantRecord};

// =============================================================================
// Table Definitions
// =============================================================================

const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

const DATA_BY_WALLET: TableDefinition<&[u8], &[u8]> = TableDefinition::new("data_by_wallet");

const DATA_BY_REFERENCE: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("data_by_reference");

const SHARES_BY_RECIPIENT: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("shares_by_recipient");

const SHARES_BY_SENDER: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("shares_by_sender");

const API_KEYS: TableDefinition<&str, &[u8]> = TableDefinition::new("api_keys");

/// Counters: key → u64.
const INDEX_META: TableDefinition<&str, u64> = TableDefinition::new("index_meta");

const NEXT_SEQ: &str = "next_seq";

fn entries_table(table: IndexTable) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
    match table {
        IndexTable::DataByWallet => DATA_BY_WALLET,
        IndexTable::DataByReference => DATA_BY_REFERENCE,
        IndexTable::SharesByRecipient => SHARES_BY_RECIPIENT,
        IndexTable::SharesBySender => SHARES_BY_SENDER,
    }
}

// =============================================================================
// RedbIndex
// =============================================================================

/// Persistent wallet index.
pub struct RedbIndex {
    db: Database,
}

impl RedbIndex {
    /// Open (or create) the index at the given path.
    pub fn open(path: &Path) -> IndexResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
            for table in IndexTable::ALL {
                let _ = write_txn.open_table(entries_table(table))?;
            }
            let _ = write_txn.open_table(API_KEYS)?;
            let _ = write_txn.open_table(INDEX_META)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Opened wallet index");
        Ok(Self { db })
    }
}

#[async_trait]
impl WalletIndex for RedbIndex {
    async fn put_wallet(&self, key: &str, record: Vec<u8>) -> IndexResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLETS)?;
            table.insert(key, record.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn get_wallet(&self, key: &str) -> IndexResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        Ok(table.get(key)?.map(|value| value.value().to_vec()))
    }

    async fn append(
        &self,
        postings: &[Posting],
        created_at: &str,
        record: Vec<u8>,
    ) -> IndexResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut meta = write_txn.open_table(INDEX_META)?;
            let seq = meta.get(NEXT_SEQ)?.map(|v| v.value()).unwrap_or(0);
            meta.insert(NEXT_SEQ, seq + 1)?;

            for posting in postings {
                let mut table = write_txn.open_table(entries_table(posting.table))?;
                let key = keys::index_key(&posting.partition, created_at, seq);
                table.insert(key.as_slice(), record.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn query(&self, query: IndexQuery<'_>) -> IndexResult<IndexPage> {
        if let Some(cursor) = query.after {
            check_cursor(query.partition, cursor)?;
        }

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(entries_table(query.table))?;

        let prefix = keys::partition_prefix(query.partition);
        let end = keys::partition_end(query.partition);
        let range = table.range::<&[u8]>(scan_bounds(query.order, query.after, &prefix, &end))?;

        let entries: Box<dyn Iterator<Item = _>> = match query.order {
            ScanOrder::Ascending => Box::new(range),
            ScanOrder::Descending => Box::new(range.rev()),
        };

        let mut page = IndexPage::default();
        let mut last_key: Option<Vec<u8>> = None;
        for entry in entries.take(query.limit) {
            let (key, value) = entry?;
            page.records.push(value.value().to_vec());
            last_key = Some(key.value().to_vec());
        }

        if page.records.len() >= query.limit {
            page.next = last_key.map(IndexCursor);
        }
        Ok(page)
    }
}

#[async_trait]
impl TenantDirectory for RedbIndex {
    async fn register_tenant(&self, record: TenantRecord) -> IndexResult<()> {
        let json = serde_json::to_vec(&record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(API_KEYS)?;
            table.insert(record.key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn find_tenant(&self, api_key: &str) -> IndexResult<Option<TenantRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(API_KEYS)?;
        match table.get(api_key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
