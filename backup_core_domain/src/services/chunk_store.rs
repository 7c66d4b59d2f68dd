// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Store Port
//!
//! The content-addressed chunk store is downstream of this core and out of
//! scope as an implementation (§1, §6); only the contract is defined here so
//! the Batch Scheduler's use cases can be wired against it without this
//! crate depending on a concrete storage backend.

use crate::value_objects::Digest;
use crate::CoreError;
use async_trait::async_trait;

/// `put`/`has`/`get` over content-addressed byte ranges. Writes are
/// idempotent: putting the same `(hash, bytes)` twice is not an error.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn put(&self, hash: &Digest, bytes: &[u8]) -> Result<(), CoreError>;
    async fn has(&self, hash: &Digest) -> Result<bool, CoreError>;
    async fn get(&self, hash: &Digest) -> Result<Vec<u8>, CoreError>;
}

#[async_trait]
impl<T: ChunkStore + ?Sized> ChunkStore for std::sync::Arc<T> {
    async fn put(&self, hash: &Digest, bytes: &[u8]) -> Result<(), CoreError> {
        (**self).put(hash, bytes).await
    }

    async fn has(&self, hash: &Digest) -> Result<bool, CoreError> {
        (**self).has(hash).await
    }

    async fn get(&self, hash: &Digest) -> Result<Vec<u8>, CoreError> {
        (**self).get(hash).await
    }
}
