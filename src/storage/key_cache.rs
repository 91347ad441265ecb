// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for wallet public keys.
//!
//! A wallet id is the hash of its public key, so a cached key can only go
//! stale if the wallet record itself disappears. The TTL bounds that window.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

struct CacheEntry {
    public_key_base64: String,
    inserted_at: Instant,
}

/// In-process LRU cache of `tenant/wallet` → public key.
pub struct PublicKeyCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl PublicKeyCache {
    /// Create a cache holding at most `capacity` keys (minimum 1).
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached key, or `None` if absent or expired.
    pub fn get(&self, wallet_key: &str) -> Option<String> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(wallet_key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.public_key_base64.clone());
            }
            cache.pop(wallet_key);
        }
        None
    }

    pub fn put(&self, wallet_key: &str, public_key_base64: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                wallet_key.to_string(),
                CacheEntry {
                    public_key_base64: public_key_base64.to_string(),
                    inserted_at: Instant::now(),
                },
            );
        }
    }
}
