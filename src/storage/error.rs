// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage error types.
//!
//! Backends report [`IndexError`] and [`BlobError`]; the wallet store wraps
//! them in [`StoreError`] next to its own validation and lookup failures.

// =============================================================================
// Index
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("index lock poisoned")]
    Poisoned,

    #[error("invalid cursor for partition {0}")]
    InvalidCursor(String),
}

pub type IndexResult<T> = Result<T, IndexError>;

// =============================================================================
// Blob
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob store lock poisoned")]
    Poisoned,
}

pub type BlobResult<T> = Result<T, BlobError>;

// =============================================================================
// Wallet Store
// =============================================================================

/// Failure of a wallet store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed input; never retryable
    #[error("{0}")]
    Validation(String),

    /// Requested wallet, item or share does not exist
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }

    /// Whether the caller may retry the same request unchanged.
    ///
    /// Backend I/O failures are transient; validation, lookup and
    /// corrupted-record failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Index(IndexError::InvalidCursor(_))
            | StoreError::Index(IndexError::Encoding(_))
            | StoreError::Index(IndexError::Poisoned)
            | StoreError::Blob(BlobError::Poisoned) => false,
            StoreError::Index(_) | StoreError::Blob(_) => true,
            StoreError::Validation(_) | StoreError::NotFound(_) | StoreError::Serialization(_) => {
                false
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
