// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Chunk Store
//!
//! A reference implementation of the [`ChunkStore`] port (§1, §6: out of
//! scope as a *design* concern, but a concrete default is needed for the CLI
//! to have somewhere to deliver chunks). Objects are content-addressed and
//! sharded two hex characters deep under `root`, the same layout git uses
//! for its loose object store, so no single directory ever holds more than a
//! few hundred entries even for large trees.
//!
//! Writes are idempotent (§6 "chunk store"): `put` for a hash that already
//! exists on disk is a no-op beyond the existence check.

use std::path::PathBuf;

use async_trait::async_trait;
use backup_core_domain::services::ChunkStore;
use backup_core_domain::value_objects::Digest;
use backup_core_domain::CoreError;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
}

impl FsChunkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, hash: &Digest) -> PathBuf {
        let hex = hash.to_hex();
        let (shard, rest) = hex.split_at(2.min(hex.len()));
        self.root.join(shard).join(rest)
    }
}

#[async_trait]
impl ChunkStore for FsChunkStore {
    async fn put(&self, hash: &Digest, bytes: &[u8]) -> Result<(), CoreError> {
        let path = self.object_path(hash);
        if fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Write to a sibling temp file first so a concurrent `get` never
        // observes a partially written object.
        let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn has(&self, hash: &Digest) -> Result<bool, CoreError> {
        Ok(fs::try_exists(self.object_path(hash)).await.unwrap_or(false))
    }

    async fn get(&self, hash: &Digest) -> Result<Vec<u8>, CoreError> {
        let path = self.object_path(hash);
        fs::read(&path)
            .await
            .map_err(|_| CoreError::not_found(format!("chunk {} not found in store", hash.to_hex())))
    }
}

/// An in-memory store, useful for tests and dry-run scans that should not
/// touch disk at all.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChunkStore {
    objects: std::sync::Arc<parking_lot::Mutex<std::collections::HashMap<Digest, Vec<u8>>>>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn put(&self, hash: &Digest, bytes: &[u8]) -> Result<(), CoreError> {
        self.objects.lock().entry(hash.clone()).or_insert_with(|| bytes.to_vec());
        Ok(())
    }

    async fn has(&self, hash: &Digest) -> Result<bool, CoreError> {
        Ok(self.objects.lock().contains_key(hash))
    }

    async fn get(&self, hash: &Digest) -> Result<Vec<u8>, CoreError> {
        self.objects
            .lock()
            .get(hash)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("chunk {} not found in store", hash.to_hex())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsChunkStore::new(dir.path());
        let hash = Digest::new(vec![0xab, 0xcd, 0xef]);

        assert!(!store.has(&hash).await.unwrap());
        store.put(&hash, b"payload").await.unwrap();
        assert!(store.has(&hash).await.unwrap());
        assert_eq!(store.get(&hash).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn fs_store_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsChunkStore::new(dir.path());
        let hash = Digest::new(vec![1, 2, 3]);
        store.put(&hash, b"first").await.unwrap();
        store.put(&hash, b"first").await.unwrap();
        assert_eq!(store.get(&hash).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn fs_store_missing_hash_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsChunkStore::new(dir.path());
        let err = store.get(&Digest::new(vec![9, 9, 9])).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn in_memory_store_round_trips() {
        let store = InMemoryChunkStore::new();
        let hash = Digest::new(vec![7, 7, 7]);
        store.put(&hash, b"hi").await.unwrap();
        assert!(store.has(&hash).await.unwrap());
        assert_eq!(store.get(&hash).await.unwrap(), b"hi");
        assert_eq!(store.len(), 1);
    }
}
