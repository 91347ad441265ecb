// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant resolution from API keys.
//!
//! Every request carries an `x-api-key` header. The key selects the tenant
//! whose namespace all storage keys are scoped to. Keys live in a directory
//! table next to the wallet index and are seeded from configuration at
//! startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{IndexError, IndexResult};

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("missing x-api-key header")]
    MissingApiKey,

    #[error("unknown api key")]
    UnknownApiKey,

    #[error("tenant lookup failed: {0}")]
    Lookup(#[from] IndexError),
}

/// Directory entry for one API key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    pub key: String,
    pub tenant_id: String,
    pub name: String,
}

/// Maps an API key to a tenant id.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// Resolve `api_key` (empty when the header was absent).
    async fn get_tenant_id(&self, api_key: &str) -> Result<String, TenantError>;
}

/// Storage for tenant records.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn register_tenant(&self, record: TenantRecord) -> IndexResult<()>;

    async fn find_tenant(&self, api_key: &str) -> IndexResult<Option<TenantRecord>>;
}

#[async_trait]
impl<D> TenantResolver for D
where
    D: TenantDirectory + ?Sized,
{
    async fn get_tenant_id(&self, api_key: &str) -> Result<String, TenantError> {
        if api_key.is_empty() {
            return Err(TenantError::MissingApiKey);
        }
        match self.find_tenant(api_key).await? {
            Some(record) => Ok(record.tenant_id),
            None => Err(TenantError::UnknownApiKey),
        }
    }
}

/// Register `(api_key, tenant_id)` pairs, using the tenant id as the name.
pub async fn seed_tenants<D>(directory: &D, api_keys: &[(String, String)]) -> IndexResult<()>
where
    D: TenantDirectory + ?Sized,
{
    for (key, tenant_id) in api_keys {
        directory
            .register_tenant(TenantRecord {
                key: key.clone(),
                tenant_id: tenant_id.clone(),
                name: tenant_id.clone(),
            })
            .await?;
    }
    if !api_keys.is_empty() {
        info!(count = api_keys.len(), "Seeded tenant directory");
    }
    Ok(())
}
