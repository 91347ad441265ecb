// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet data store.
//!
//! [`IndexedWalletStore`] keeps every data item twice:
//!
//! - the full item (chunks included) as a JSON blob under its content
//!   address, see [`super::keys`];
//! - a small index record (summary + blob key) filed under the wallet and
//!   under the reference, or for shares under the recipient and the sender.
//!
//! The blob is written before the index record, so a crash in between leaves
//! an unreachable blob rather than a dangling index entry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::index::{BlobStore, IndexCursor, IndexQuery, IndexTable, Posting, ScanOrder, WalletIndex};
use super::keys;
use crate::auth::format_timestamp;
use crate::identity::{derive_version_hash, derive_wallet_id, is_wallet_id};
use crate::models::{
    NewDataItem, NewWallet, Wallet, WalletDataItem, WalletDataItemList, WalletDataItemSummary,
    WalletList,
};

/// Default number of blobs fetched concurrently when resolving a history.
pub const DEFAULT_HISTORY_FANOUT: usize = 8;

/// Records read per index page.
const DEFAULT_PAGE_SIZE: usize = 100;

// =============================================================================
// Trait
// =============================================================================

/// Tenant-scoped wallet and data item operations.
///
/// Callers are expected to have authorized the request against the wallet
/// they act on; the store itself does not check signatures.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Register a wallet, deriving its id from the public key.
    ///
    /// Registering the same key again overwrites the record.
    async fn create_wallet(&self, tenant_id: &str, new_wallet: NewWallet) -> StoreResult<Wallet>;

    async fn get_wallet(&self, tenant_id: &str, wallet_id: &str) -> StoreResult<Wallet>;

    /// Summaries of every item the wallet owns, grouped by reference.
    async fn list_data(&self, tenant_id: &str, wallet_id: &str) -> StoreResult<WalletList>;

    /// Most recent version of a reference.
    async fn get_latest_data_item(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        reference_id: &str,
    ) -> StoreResult<WalletDataItem>;

    /// A specific version of a reference.
    async fn get_data_item(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        reference_id: &str,
        version_hash: &str,
    ) -> StoreResult<WalletDataItem>;

    /// Every version of a reference, oldest first.
    async fn get_data_item_history(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        reference_id: &str,
    ) -> StoreResult<WalletDataItemList>;

    /// Append a new version. `created_at` is the authenticated request time.
    async fn add_data_item(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        item: NewDataItem,
        created_at: DateTime<Utc>,
    ) -> StoreResult<WalletDataItemSummary>;

    /// Deposit an item for another wallet of the same tenant.
    async fn share_data_item(
        &self,
        tenant_id: &str,
        from_wallet: &str,
        to_wallet: &str,
        item: NewDataItem,
        created_at: DateTime<Utc>,
    ) -> StoreResult<WalletDataItemSummary>;

    /// Shares received by `to_wallet`, grouped by reference.
    async fn list_shared_items(&self, tenant_id: &str, to_wallet: &str) -> StoreResult<WalletList>;

    /// Shares sent by `from_wallet`, grouped by reference.
    async fn list_sent_shares(&self, tenant_id: &str, from_wallet: &str)
        -> StoreResult<WalletList>;

    async fn get_shared_data_item(
        &self,
        tenant_id: &str,
        from_wallet: &str,
        to_wallet: &str,
        reference_id: &str,
        version_hash: &str,
    ) -> StoreResult<WalletDataItem>;
}

// =============================================================================
// Index Records
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWallet {
    /// `tenant/wallet`
    wallet_id: String,
    tenant_id: String,
    wallet: Wallet,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataIndexRecord {
    /// `tenant/wallet`
    wallet_id: String,
    object_key: String,
    summary: WalletDataItemSummary,
    /// `tenant/wallet/reference`
    reference_id: String,
    created_at: String,
    version_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareIndexRecord {
    reference_id: String,
    object_key: String,
    summary: WalletDataItemSummary,
    /// `tenant/from`
    from_wallet: String,
    /// `tenant/to`
    to_wallet: String,
    created_at: String,
    version_hash: String,
}

trait HasSummary {
    fn into_summary(self) -> WalletDataItemSummary;
}

impl HasSummary for DataIndexRecord {
    fn into_summary(self) -> WalletDataItemSummary {
        self.summary
    }
}

impl HasSummary for ShareIndexRecord {
    fn into_summary(self) -> WalletDataItemSummary {
        self.summary
    }
}

// =============================================================================
// IndexedWalletStore
// =============================================================================

/// [`WalletStore`] over a [`WalletIndex`] and a [`BlobStore`].
pub struct IndexedWalletStore {
    index: Arc<dyn WalletIndex>,
    blobs: Arc<dyn BlobStore>,
    history_fanout: usize,
    page_size: usize,
}

impl IndexedWalletStore {
    pub fn new(index: Arc<dyn WalletIndex>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            index,
            blobs,
            history_fanout: DEFAULT_HISTORY_FANOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the number of concurrent blob reads per history request (minimum 1).
    pub fn with_history_fanout(mut self, fanout: usize) -> Self {
        self.history_fanout = fanout.max(1);
        self
    }

    /// Set the number of index records read per page (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Read every record of a partition in ascending order.
    ///
    /// Records that fail to decode are logged and skipped.
    async fn scan_all<R: DeserializeOwned + Send>(
        &self,
        table: IndexTable,
        partition: &str,
    ) -> StoreResult<Vec<R>> {
        let mut records = Vec::new();
        let mut cursor: Option<IndexCursor> = None;

        loop {
            let page = self
                .index
                .query(IndexQuery {
                    table,
                    partition,
                    order: ScanOrder::Ascending,
                    after: cursor.as_ref(),
                    limit: self.page_size,
                })
                .await?;

            for raw in page.records {
                match serde_json::from_slice::<R>(&raw) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(
                        table = table.name(),
                        partition,
                        error = %e,
                        "Skipping undecodable index record"
                    ),
                }
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn list_summaries<R: DeserializeOwned + HasSummary + Send>(
        &self,
        table: IndexTable,
        partition: &str,
    ) -> StoreResult<WalletList> {
        let mut list = WalletList::default();
        for record in self.scan_all::<R>(table, partition).await? {
            list.push(record.into_summary());
        }
        Ok(list)
    }

    async fn load_item(&self, object_key: String) -> StoreResult<WalletDataItem> {
        let bytes = self
            .blobs
            .get(&object_key)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("cannot find {object_key}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn store_item(&self, object_key: &str, item: &WalletDataItem) -> StoreResult<()> {
        let bytes = serde_json::to_vec(item)?;
        self.blobs.put(object_key, bytes).await?;
        Ok(())
    }
}

/// Validate an incoming item and assign its server-side fields.
fn prepare_item(item: NewDataItem, created_at: DateTime<Utc>) -> StoreResult<WalletDataItem> {
    if item.reference_id.is_empty() {
        return Err(StoreError::validation("missing referenceId"));
    }

    let version_hash = derive_version_hash(item.encrypted_chunks.as_slice());
    Ok(WalletDataItem {
        reference_id: item.reference_id,
        encrypted_chunks: item.encrypted_chunks,
        version_hash,
        data_signature: item.data_signature,
        created_at: format_timestamp(created_at),
    })
}

#[async_trait]
impl WalletStore for IndexedWalletStore {
    async fn create_wallet(&self, tenant_id: &str, new_wallet: NewWallet) -> StoreResult<Wallet> {
        let wallet_id = derive_wallet_id(&new_wallet.public_key_base64)
            .map_err(|e| StoreError::validation(e.to_string()))?;

        let wallet = Wallet {
            tenant_id: tenant_id.to_string(),
            wallet_id: wallet_id.clone(),
            public_key_base64: new_wallet.public_key_base64,
            private_key_encrypted: new_wallet.private_key_encrypted,
        };

        let key = keys::wallet_key(tenant_id, &wallet_id);
        let record = StoredWallet {
            wallet_id: key.clone(),
            tenant_id: tenant_id.to_string(),
            wallet: wallet.clone(),
        };
        self.index.put_wallet(&key, serde_json::to_vec(&record)?).await?;

        info!(tenant_id, wallet_id = %wallet_id, "Wallet created");
        Ok(wallet)
    }

    async fn get_wallet(&self, tenant_id: &str, wallet_id: &str) -> StoreResult<Wallet> {
        let key = keys::wallet_key(tenant_id, wallet_id);
        let bytes = self
            .index
            .get_wallet(&key)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("cannot find wallet {key}")))?;
        let record: StoredWallet = serde_json::from_slice(&bytes)?;
        Ok(record.wallet)
    }

    async fn list_data(&self, tenant_id: &str, wallet_id: &str) -> StoreResult<WalletList> {
        debug!(tenant_id, wallet_id, "Listing wallet data");
        self.list_summaries::<DataIndexRecord>(
            IndexTable::DataByWallet,
            &keys::wallet_key(tenant_id, wallet_id),
        )
        .await
    }

    async fn get_latest_data_item(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        reference_id: &str,
    ) -> StoreResult<WalletDataItem> {
        let partition = keys::reference_partition(tenant_id, wallet_id, reference_id);
        let page = self
            .index
            .query(IndexQuery {
                table: IndexTable::DataByReference,
                partition: &partition,
                order: ScanOrder::Descending,
                after: None,
                limit: 1,
            })
            .await?;

        let raw = page
            .records
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(format!("cannot find {partition}")))?;
        let record: DataIndexRecord = serde_json::from_slice(&raw)?;

        debug!(
            tenant_id,
            wallet_id,
            reference_id,
            version_hash = %record.version_hash,
            "Resolved latest version"
        );
        self.load_item(record.object_key).await
    }

    async fn get_data_item(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        reference_id: &str,
        version_hash: &str,
    ) -> StoreResult<WalletDataItem> {
        self.load_item(keys::data_object_key(tenant_id, wallet_id, reference_id, version_hash))
            .await
    }

    async fn get_data_item_history(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        reference_id: &str,
    ) -> StoreResult<WalletDataItemList> {
        let partition = keys::reference_partition(tenant_id, wallet_id, reference_id);
        let records: Vec<DataIndexRecord> =
            self.scan_all(IndexTable::DataByReference, &partition).await?;

        debug!(
            tenant_id,
            wallet_id,
            reference_id,
            versions = records.len(),
            "Resolving version history"
        );

        let loads: Vec<_> = records
            .into_iter()
            .map(|record| self.load_item(record.object_key))
            .collect();

        // `buffered` keeps input order regardless of completion order and the
        // first failure aborts the whole collection.
        let items = stream::iter(loads)
            .buffered(self.history_fanout)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(WalletDataItemList { items })
    }

    async fn add_data_item(
        &self,
        tenant_id: &str,
        wallet_id: &str,
        item: NewDataItem,
        created_at: DateTime<Utc>,
    ) -> StoreResult<WalletDataItemSummary> {
        let item = prepare_item(item, created_at)?;
        let object_key =
            keys::data_object_key(tenant_id, wallet_id, &item.reference_id, &item.version_hash);
        let wallet_partition = keys::wallet_key(tenant_id, wallet_id);
        let reference_partition =
            keys::reference_partition(tenant_id, wallet_id, &item.reference_id);

        self.store_item(&object_key, &item).await?;

        let summary = item.summary();
        let record = DataIndexRecord {
            wallet_id: wallet_partition.clone(),
            object_key,
            summary: summary.clone(),
            reference_id: reference_partition.clone(),
            created_at: item.created_at.clone(),
            version_hash: item.version_hash.clone(),
        };
        let postings = [
            Posting::new(IndexTable::DataByWallet, wallet_partition),
            Posting::new(IndexTable::DataByReference, reference_partition),
        ];
        self.index
            .append(&postings, &item.created_at, serde_json::to_vec(&record)?)
            .await?;

        info!(
            tenant_id,
            wallet_id,
            reference_id = %item.reference_id,
            version_hash = %item.version_hash,
            chunks = item.encrypted_chunks.len(),
            "Data item saved"
        );
        Ok(summary)
    }

    async fn share_data_item(
        &self,
        tenant_id: &str,
        from_wallet: &str,
        to_wallet: &str,
        item: NewDataItem,
        created_at: DateTime<Utc>,
    ) -> StoreResult<WalletDataItemSummary> {
        if !is_wallet_id(to_wallet) {
            return Err(StoreError::validation(format!(
                "invalid recipient wallet id: {to_wallet}"
            )));
        }
        let item = prepare_item(item, created_at)?;
        let object_key = keys::share_object_key(
            tenant_id,
            from_wallet,
            to_wallet,
            &item.reference_id,
            &item.version_hash,
        );
        let recipient_partition = keys::share_partition(tenant_id, to_wallet);
        let sender_partition = keys::share_partition(tenant_id, from_wallet);

        self.store_item(&object_key, &item).await?;

        let summary = item.summary();
        let record = ShareIndexRecord {
            reference_id: item.reference_id.clone(),
            object_key,
            summary: summary.clone(),
            from_wallet: sender_partition.clone(),
            to_wallet: recipient_partition.clone(),
            created_at: item.created_at.clone(),
            version_hash: item.version_hash.clone(),
        };
        let postings = [
            Posting::new(IndexTable::SharesByRecipient, recipient_partition),
            Posting::new(IndexTable::SharesBySender, sender_partition),
        ];
        self.index
            .append(&postings, &item.created_at, serde_json::to_vec(&record)?)
            .await?;

        info!(
            tenant_id,
            from_wallet,
            to_wallet,
            reference_id = %item.reference_id,
            version_hash = %item.version_hash,
            "Data item shared"
        );
        Ok(summary)
    }

    async fn list_shared_items(&self, tenant_id: &str, to_wallet: &str) -> StoreResult<WalletList> {
        self.list_summaries::<ShareIndexRecord>(
            IndexTable::SharesByRecipient,
            &keys::share_partition(tenant_id, to_wallet),
        )
        .await
    }

    async fn list_sent_shares(
        &self,
        tenant_id: &str,
        from_wallet: &str,
    ) -> StoreResult<WalletList> {
        self.list_summaries::<ShareIndexRecord>(
            IndexTable::SharesBySender,
            &keys::share_partition(tenant_id, from_wallet),
        )
        .await
    }

    async fn get_shared_data_item(
        &self,
        tenant_id: &str,
        from_wallet: &str,
        to_wallet: &str,
        reference_id: &str,
        version_hash: &str,
    ) -> StoreResult<WalletDataItem> {
        self.load_item(keys::share_object_key(
            tenant_id,
            from_wallet,
            to_wallet,
            reference_id,
            version_hash,
        ))
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::parse_timestamp;
    use crate::storage::error::BlobResult;
    use crate::storage::{FsBlobStore, MemoryBlobStore, MemoryIndex, RedbIndex};
    use base64ct::{Base64, Encoding};
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn memory_store() -> IndexedWalletStore {
        IndexedWalletStore::new(Arc::new(MemoryIndex::new()), Arc::new(MemoryBlobStore::new()))
    }

    fn key_b64(label: &str) -> String {
        Base64::encode_string(
            format!("-----BEGIN RSA PUBLIC KEY-----\n{label}\n-----END RSA PUBLIC KEY-----\n")
                .as_bytes(),
        )
    }

    fn t(offset_ms: i64) -> DateTime<Utc> {
        parse_timestamp("2026-02-01T10:00:00.000Z").unwrap() + TimeDelta::milliseconds(offset_ms)
    }

    fn item(reference_id: &str, chunks: &[&str]) -> NewDataItem {
        NewDataItem {
            reference_id: reference_id.to_string(),
            encrypted_chunks: chunks.iter().map(|c| c.to_string()).collect(),
            data_signature: format!("sig-{reference_id}"),
        }
    }

    async fn wallet(store: &IndexedWalletStore, tenant: &str, label: &str) -> Wallet {
        store
            .create_wallet(
                tenant,
                NewWallet {
                    public_key_base64: key_b64(label),
                    private_key_encrypted: format!("enc-{label}"),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_wallet_derives_id_and_round_trips() {
        let store = memory_store();
        let created = wallet(&store, "acme", "alice").await;

        assert_eq!(created.wallet_id, derive_wallet_id(&key_b64("alice")).unwrap());
        assert_eq!(created.tenant_id, "acme");

        let loaded = store.get_wallet("acme", &created.wallet_id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn create_wallet_twice_overwrites() {
        let store = memory_store();
        let first = wallet(&store, "acme", "alice").await;
        let second = store
            .create_wallet(
                "acme",
                NewWallet {
                    public_key_base64: key_b64("alice"),
                    private_key_encrypted: "rotated".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(first.wallet_id, second.wallet_id);
        let loaded = store.get_wallet("acme", &first.wallet_id).await.unwrap();
        assert_eq!(loaded.private_key_encrypted, "rotated");
    }

    #[tokio::test]
    async fn create_wallet_rejects_blank_key() {
        let store = memory_store();
        let result = store
            .create_wallet(
                "acme",
                NewWallet {
                    public_key_base64: String::new(),
                    private_key_encrypted: String::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn wallets_are_tenant_scoped() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;

        let other_tenant = store.get_wallet("globex", &alice.wallet_id).await;
        assert!(matches!(other_tenant, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn add_data_item_assigns_hash_and_timestamp() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;

        let summary = store
            .add_data_item("acme", &alice.wallet_id, item("doc", &["a", "b"]), t(0))
            .await
            .unwrap();

        assert_eq!(summary.version_hash, derive_version_hash(&["a", "b"]));
        assert_eq!(summary.created_at, "2026-02-01T10:00:00.000Z");
        assert_eq!(summary.data_signature, "sig-doc");

        let stored = store
            .get_data_item("acme", &alice.wallet_id, "doc", &summary.version_hash)
            .await
            .unwrap();
        assert_eq!(stored.encrypted_chunks, vec!["a", "b"]);
        assert_eq!(stored.summary(), summary);
    }

    #[tokio::test]
    async fn add_data_item_requires_reference() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;

        let result = store
            .add_data_item("acme", &alice.wallet_id, item("", &["a"]), t(0))
            .await;
        assert!(matches!(result, Err(StoreError::Validation(m)) if m == "missing referenceId"));
    }

    #[tokio::test]
    async fn latest_and_history_follow_creation_order() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        store.add_data_item("acme", w, item("doc", &["v1"]), t(0)).await.unwrap();
        store.add_data_item("acme", w, item("doc", &["v2"]), t(100)).await.unwrap();
        store.add_data_item("acme", w, item("other", &["x"]), t(150)).await.unwrap();
        store.add_data_item("acme", w, item("doc", &["v3"]), t(200)).await.unwrap();

        let latest = store.get_latest_data_item("acme", w, "doc").await.unwrap();
        assert_eq!(latest.encrypted_chunks, vec!["v3"]);

        let history = store.get_data_item_history("acme", w, "doc").await.unwrap();
        let chunks: Vec<_> = history
            .items
            .iter()
            .map(|i| i.encrypted_chunks[0].as_str())
            .collect();
        assert_eq!(chunks, vec!["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn same_timestamp_resolves_by_insertion_order() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        store.add_data_item("acme", w, item("doc", &["first"]), t(0)).await.unwrap();
        store.add_data_item("acme", w, item("doc", &["second"]), t(0)).await.unwrap();

        let latest = store.get_latest_data_item("acme", w, "doc").await.unwrap();
        assert_eq!(latest.encrypted_chunks, vec!["second"]);
    }

    #[tokio::test]
    async fn identical_content_appends_duplicate_history_entry() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        let first = store.add_data_item("acme", w, item("doc", &["same"]), t(0)).await.unwrap();
        let second = store.add_data_item("acme", w, item("doc", &["same"]), t(10)).await.unwrap();
        assert_eq!(first.version_hash, second.version_hash);

        let history = store.get_data_item_history("acme", w, "doc").await.unwrap();
        assert_eq!(history.items.len(), 2);
        // Both entries resolve to the last write at the shared address.
        assert!(history
            .items
            .iter()
            .all(|i| i.created_at == "2026-02-01T10:00:00.010Z"));
    }

    #[tokio::test]
    async fn history_spans_many_pages_with_small_fanout() {
        let store = memory_store().with_page_size(3).with_history_fanout(2);
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        for i in 0..10 {
            let chunk = format!("v{i}");
            store
                .add_data_item("acme", w, item("doc", &[chunk.as_str()]), t(i * 10))
                .await
                .unwrap();
        }

        let history = store.get_data_item_history("acme", w, "doc").await.unwrap();
        let expected: Vec<String> = (0..10).map(|i| format!("v{i}")).collect();
        let actual: Vec<String> = history
            .items
            .into_iter()
            .map(|i| i.encrypted_chunks[0].clone())
            .collect();
        assert_eq!(actual, expected);
    }

    /// Blob store whose reads finish in reverse call order.
    struct SlowFirstBlobStore {
        inner: MemoryBlobStore,
        calls: AtomicUsize,
        completed: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl BlobStore for SlowFirstBlobStore {
        async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()> {
            self.inner.put(key, bytes).await
        }

        async fn get(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = 10u64.saturating_sub(call as u64) * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.completed.lock().unwrap().push(call);
            self.inner.get(key).await
        }
    }

    #[tokio::test]
    async fn history_keeps_request_order_when_reads_finish_out_of_order() {
        let blobs = Arc::new(SlowFirstBlobStore {
            inner: MemoryBlobStore::new(),
            calls: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        });
        let store = IndexedWalletStore::new(Arc::new(MemoryIndex::new()), blobs.clone())
            .with_history_fanout(4);
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        for i in 0..6 {
            let chunk = format!("v{i}");
            store
                .add_data_item("acme", w, item("doc", &[chunk.as_str()]), t(i * 10))
                .await
                .unwrap();
        }

        let history = store.get_data_item_history("acme", w, "doc").await.unwrap();
        let actual: Vec<String> = history
            .items
            .into_iter()
            .map(|i| i.encrypted_chunks[0].clone())
            .collect();
        let expected: Vec<String> = (0..6).map(|i| format!("v{i}")).collect();
        assert_eq!(actual, expected);

        let completed = blobs.completed.lock().unwrap().clone();
        assert_eq!(completed.len(), 6);
        assert_ne!(completed, (0..6).collect::<Vec<_>>(), "reads finished in request order");
    }

    #[tokio::test]
    async fn history_of_unknown_reference_is_empty() {
        let store = memory_store();
        let history = store
            .get_data_item_history("acme", "nobody", "doc")
            .await
            .unwrap();
        assert!(history.items.is_empty());
    }

    #[tokio::test]
    async fn history_fails_when_any_blob_is_missing() {
        let index = Arc::new(MemoryIndex::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = IndexedWalletStore::new(index.clone(), blobs);
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        store.add_data_item("acme", w, item("doc", &["v1"]), t(0)).await.unwrap();

        // An index entry whose blob was never written.
        let orphan = DataIndexRecord {
            wallet_id: keys::wallet_key("acme", w),
            object_key: keys::data_object_key("acme", w, "doc", "missing"),
            summary: WalletDataItemSummary {
                reference_id: "doc".to_string(),
                data_signature: String::new(),
                created_at: "2026-02-01T10:00:01.000Z".to_string(),
                version_hash: "missing".to_string(),
            },
            reference_id: keys::reference_partition("acme", w, "doc"),
            created_at: "2026-02-01T10:00:01.000Z".to_string(),
            version_hash: "missing".to_string(),
        };
        index
            .append(
                &[Posting::new(
                    IndexTable::DataByReference,
                    keys::reference_partition("acme", w, "doc"),
                )],
                "2026-02-01T10:00:01.000Z",
                serde_json::to_vec(&orphan).unwrap(),
            )
            .await
            .unwrap();

        let result = store.get_data_item_history("acme", w, "doc").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn undecodable_index_records_are_skipped_in_listings() {
        let index = Arc::new(MemoryIndex::new());
        let store = IndexedWalletStore::new(index.clone(), Arc::new(MemoryBlobStore::new()));
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        store.add_data_item("acme", w, item("doc", &["v1"]), t(0)).await.unwrap();
        index
            .append(
                &[Posting::new(IndexTable::DataByWallet, keys::wallet_key("acme", w))],
                "2026-02-01T10:00:05.000Z",
                b"not json".to_vec(),
            )
            .await
            .unwrap();

        let list = store.list_data("acme", w).await.unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items["doc"].len(), 1);
    }

    #[tokio::test]
    async fn latest_of_unknown_reference_is_not_found() {
        let store = memory_store();
        let result = store.get_latest_data_item("acme", "nobody", "doc").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_data_groups_by_reference() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;
        let w = alice.wallet_id.as_str();

        store.add_data_item("acme", w, item("doc", &["1"]), t(0)).await.unwrap();
        store.add_data_item("acme", w, item("profile", &["2"]), t(10)).await.unwrap();
        store.add_data_item("acme", w, item("doc", &["3"]), t(20)).await.unwrap();

        let list = store.list_data("acme", w).await.unwrap();
        assert_eq!(list.items.len(), 2);
        let doc: Vec<_> = list.items["doc"].iter().map(|s| s.created_at.as_str()).collect();
        assert_eq!(doc, vec!["2026-02-01T10:00:00.000Z", "2026-02-01T10:00:00.020Z"]);

        let empty = store.list_data("acme", "nobody").await.unwrap();
        assert!(empty.items.is_empty());
    }

    #[tokio::test]
    async fn share_is_visible_to_recipient_and_sender_only() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;
        let bob = wallet(&store, "acme", "bob").await;
        let (a, b) = (alice.wallet_id.as_str(), bob.wallet_id.as_str());

        let summary = store
            .share_data_item("acme", a, b, item("report", &["c1", "c2"]), t(0))
            .await
            .unwrap();

        let inbox = store.list_shared_items("acme", b).await.unwrap();
        assert_eq!(inbox.items["report"], vec![summary.clone()]);

        let outbox = store.list_sent_shares("acme", a).await.unwrap();
        assert_eq!(outbox.items["report"], vec![summary.clone()]);

        assert!(store.list_shared_items("acme", a).await.unwrap().items.is_empty());
        assert!(store.list_data("acme", a).await.unwrap().items.is_empty());

        let shared = store
            .get_shared_data_item("acme", a, b, "report", &summary.version_hash)
            .await
            .unwrap();
        assert_eq!(shared.encrypted_chunks, vec!["c1", "c2"]);

        // Share blobs never land in the owner's data namespace.
        let owned = store
            .get_data_item("acme", a, "report", &summary.version_hash)
            .await;
        assert!(matches!(owned, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn share_rejects_malformed_recipient() {
        let store = memory_store();
        let alice = wallet(&store, "acme", "alice").await;

        let result = store
            .share_data_item("acme", &alice.wallet_id, "bob", item("doc", &["a"]), t(0))
            .await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn persistent_backends_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index.redb");
        let blob_root = dir.path().join("blobs");

        let wallet_id;
        {
            let store = IndexedWalletStore::new(
                Arc::new(RedbIndex::open(&index_path).unwrap()),
                Arc::new(FsBlobStore::open(&blob_root).await.unwrap()),
            );
            wallet_id = wallet(&store, "acme", "alice").await.wallet_id;
            store
                .add_data_item("acme", &wallet_id, item("doc", &["v1"]), t(0))
                .await
                .unwrap();
            store
                .add_data_item("acme", &wallet_id, item("doc", &["v2"]), t(10))
                .await
                .unwrap();
        }

        let store = IndexedWalletStore::new(
            Arc::new(RedbIndex::open(&index_path).unwrap()),
            Arc::new(FsBlobStore::open(&blob_root).await.unwrap()),
        );
        assert!(store.get_wallet("acme", &wallet_id).await.is_ok());
        let latest = store.get_latest_data_item("acme", &wallet_id, "doc").await.unwrap();
        assert_eq!(latest.encrypted_chunks, vec!["v2"]);
        let history = store
            .get_data_item_history("acme", &wallet_id, "doc")
            .await
            .unwrap();
        assert_eq!(history.items.len(), 2);
    }
}
