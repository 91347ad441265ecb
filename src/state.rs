// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::storage::{
    BlobStore, FsBlobStore, IndexError, IndexedWalletStore, MemoryBlobStore, MemoryIndex,
    PublicKeyCache, RedbIndex, StoreError, WalletIndex, WalletStore,
};
use crate::tenants::{seed_tenants, TenantDirectory, TenantResolver};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WalletStore>,
    pub tenants: Arc<dyn TenantResolver>,
    pub key_cache: Arc<PublicKeyCache>,
    pub max_body_bytes: usize,
    /// Set for persistent backends; probed by readiness checks.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to open storage: {0}")]
    Storage(#[from] StoreError),
}

impl AppState {
    pub fn new(
        store: Arc<dyn WalletStore>,
        tenants: Arc<dyn TenantResolver>,
        key_cache: PublicKeyCache,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            store,
            tenants,
            key_cache: Arc::new(key_cache),
            max_body_bytes,
            data_dir: None,
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    /// Build the state for the configured storage backend and seed the
    /// tenant directory from `API_KEYS`.
    pub async fn from_config(config: &Config) -> Result<Self, StateError> {
        let key_cache = PublicKeyCache::new(config.key_cache_capacity, config.key_cache_ttl);

        let state = match config.storage_backend {
            StorageBackend::Redb => {
                let index = Arc::new(RedbIndex::open(&config.data_dir.join("index.redb"))?);
                let blobs = FsBlobStore::open(config.data_dir.join("blobs"))
                    .await
                    .map_err(StoreError::from)?;
                seed_tenants(index.as_ref(), &config.api_keys).await?;
                Self::assemble(index, Arc::new(blobs), config, key_cache)
                    .with_data_dir(config.data_dir.clone())
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                let index = Arc::new(MemoryIndex::new());
                seed_tenants(index.as_ref(), &config.api_keys).await?;
                Self::assemble(index, Arc::new(MemoryBlobStore::new()), config, key_cache)
            }
        };

        Ok(state)
    }

    /// In-memory state with the given `(api_key, tenant_id)` pairs.
    pub async fn in_memory(api_keys: &[(String, String)]) -> Result<Self, StateError> {
        let config = Config {
            storage_backend: StorageBackend::Memory,
            api_keys: api_keys.to_vec(),
            ..Config::default()
        };
        Self::from_config(&config).await
    }

    fn assemble<I>(
        index: Arc<I>,
        blobs: Arc<dyn BlobStore>,
        config: &Config,
        key_cache: PublicKeyCache,
    ) -> Self
    where
        I: WalletIndex + TenantDirectory + 'static,
    {
        let store = IndexedWalletStore::new(index.clone(), blobs)
            .with_history_fanout(config.history_fanout);
        Self::new(Arc::new(store), index, key_cache, config.max_body_bytes)
    }
}

impl From<IndexError> for StateError {
    fn from(err: IndexError) -> Self {
        StateError::Storage(err.into())
    }
}
