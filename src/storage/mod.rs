// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for wallets, versioned data items and shares.
//!
//! ## Layers
//!
//! - [`WalletStore`]: the tenant-scoped operations the API calls
//! - [`WalletIndex`] / [`BlobStore`]: the two backing services it runs on
//! - backends: [`RedbIndex`] + [`FsBlobStore`] (persistent),
//!   [`MemoryIndex`] + [`MemoryBlobStore`] (ephemeral)
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   index.redb            # wallets, secondary indexes, api keys
//!   blobs/objects/{aa}/   # data item and share blobs
//! ```

pub mod blob;
pub mod error;
pub mod index;
pub mod key_cache;
pub mod keys;
pub mod memory;
pub mod redb_index;
pub mod wallet_store;

pub use blob::FsBlobStore;
pub use error::{BlobError, IndexError, IndexResult, StoreError, StoreResult};
pub use index::{BlobStore, IndexTable, WalletIndex};
pub use key_cache::PublicKeyCache;
pub use memory::{MemoryBlobStore, MemoryIndex};
pub use redb_index::RedbIndex;
pub use wallet_store::{IndexedWalletStore, WalletStore};
