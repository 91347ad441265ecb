// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem blob store.
//!
//! ## Layout
//!
//! ```text
//! {root}/objects/{aa}/{digest}
//! ```
//!
//! `digest` is the unpadded URL-safe base64 SHA-256 of the object key and
//! `aa` its first two characters. Object keys embed caller-chosen reference
//! ids, so they never reach the filesystem directly.
//!
//! Writes go to a temp file in the same directory first, then rename.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::error::BlobResult;
use super::index::BlobStore;

/// Blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create the store, creating `{root}/objects` if needed.
    pub async fn open(root: impl AsRef<Path>) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("objects")).await?;
        Ok(Self { root })
    }

    /// File path holding the object stored under `key`.
    pub fn object_path(&self, key: &str) -> PathBuf {
        let digest = Base64UrlUnpadded::encode_string(&Sha256::digest(key.as_bytes()));
        let shard = &digest[..2];
        self.root.join("objects").join(shard).join(&digest)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key, size = bytes.len(), "Stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
        match fs::read(self.object_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FsBlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_then_get() {
        let (store, _dir) = temp_store().await;
        store
            .put("data/t/w/doc/hash", b"{\"chunks\":[]}".to_vec())
            .await
            .unwrap();

        let bytes = store.get("data/t/w/doc/hash").await.unwrap().unwrap();
        assert_eq!(bytes, b"{\"chunks\":[]}");
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let (store, _dir) = temp_store().await;
        assert!(store.get("data/t/w/doc/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let (store, _dir) = temp_store().await;
        store.put("k", b"one".to_vec()).await.unwrap();
        store.put("k", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap(), b"two");
    }

    #[tokio::test]
    async fn traversal_keys_stay_under_root() {
        let (store, dir) = temp_store().await;
        let key = "data/t/w/../../../../etc/passwd/hash";
        store.put(key, b"x".to_vec()).await.unwrap();

        let path = store.object_path(key);
        assert!(path.starts_with(dir.path().join("objects")));
        assert!(!path.to_string_lossy().contains(".."));
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let (store, _dir) = temp_store().await;
        store.put("k", b"v".to_vec()).await.unwrap();

        let shard_dir = store.object_path("k").parent().unwrap().to_path_buf();
        let mut entries = fs::read_dir(shard_dir).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names.len(), 1);
        assert!(!names[0].ends_with(".tmp"));
    }
}
