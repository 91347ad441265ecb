// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory backing services for tests and ephemeral deployments.
//!
//! Nothing survives a restart. Index entries use the same composite keys as
//! the redb backend, so scan order and pagination behave identically.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::{BlobError, BlobResult, IndexError, IndexResult};
use super::index::{
    check_cursor, scan_bounds, BlobStore, IndexCursor, IndexPage, IndexQuery, IndexTable, Posting,
    ScanOrder, WalletIndex,
};
use super::keys;
use crate::tenants::{TenantDirectory, TenantRecord};

#[derive(Default)]
struct MemoryTables {
    wallets: HashMap<String, Vec<u8>>,
    entries: HashMap<IndexTable, BTreeMap<Vec<u8>, Vec<u8>>>,
    tenants: HashMap<String, TenantRecord>,
    next_seq: u64,
}

/// Index held in process memory.
#[derive(Default)]
pub struct MemoryIndex {
    tables: Mutex<MemoryTables>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> IndexResult<std::sync::MutexGuard<'_, MemoryTables>> {
        self.tables.lock().map_err(|_| IndexError::Poisoned)
    }
}

#[async_trait]
impl WalletIndex for MemoryIndex {
    async fn put_wallet(&self, key: &str, record: Vec<u8>) -> IndexResult<()> {
        self.lock()?.wallets.insert(key.to_string(), record);
        Ok(())
    }

    async fn get_wallet(&self, key: &str) -> IndexResult<Option<Vec<u8>>> {
        Ok(self.lock()?.wallets.get(key).cloned())
    }

    async fn append(
        &self,
        postings: &[Posting],
        created_at: &str,
        record: Vec<u8>,
    ) -> IndexResult<()> {
        let mut tables = self.lock()?;
        let seq = tables.next_seq;
        tables.next_seq += 1;

        for posting in postings {
            let key = keys::index_key(&posting.partition, created_at, seq);
            tables
                .entries
                .entry(posting.table)
                .or_default()
                .insert(key, record.clone());
        }
        Ok(())
    }

    async fn query(&self, query: IndexQuery<'_>) -> IndexResult<IndexPage> {
        if let Some(cursor) = query.after {
            check_cursor(query.partition, cursor)?;
        }

        let tables = self.lock()?;
        let Some(table) = tables.entries.get(&query.table) else {
            return Ok(IndexPage::default());
        };

        let prefix = keys::partition_prefix(query.partition);
        let end = keys::partition_end(query.partition);

        let range = table.range::<[u8], _>(scan_bounds(query.order, query.after, &prefix, &end));
        let entries: Box<dyn Iterator<Item = (&Vec<u8>, &Vec<u8>)>> = match query.order {
            ScanOrder::Ascending => Box::new(range),
            ScanOrder::Descending => Box::new(range.rev()),
        };

        let mut page = IndexPage::default();
        let mut last_key = None;
        for (key, record) in entries.take(query.limit) {
            page.records.push(record.clone());
            last_key = Some(key.clone());
        }

        if page.records.len() >= query.limit {
            page.next = last_key.map(IndexCursor);
        }
        Ok(page)
    }
}

#[async_trait]
impl TenantDirectory for MemoryIndex {
    async fn register_tenant(&self, record: TenantRecord) -> IndexResult<()> {
        self.lock()?.tenants.insert(record.key.clone(), record);
        Ok(())
    }

    async fn find_tenant(&self, api_key: &str) -> IndexResult<Option<TenantRecord>> {
        Ok(self.lock()?.tenants.get(api_key).cloned())
    }
}

/// Blob store held in process memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()> {
        self.objects
            .lock()
            .map_err(|_| BlobError::Poisoned)?
            .insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
        Ok(self
            .objects
            .lock()
            .map_err(|_| BlobError::Poisoned)?
            .get(key)
            .cloned())
    }
}
