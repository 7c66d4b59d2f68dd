// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Buffer Pool Port (C1)
//!
//! Bounded cache of reusable direct byte buffers, size-classed (§4.1). An
//! infrastructure port: `acquire` can suspend a caller when the pool is
//! exhausted and a waiting policy is configured, so it is modeled as async
//! like the teacher's `FileIOService`, even though the buffer bookkeeping
//! itself is a simple, CPU-only operation.

use crate::entities::PoolStats;
use crate::CoreError;
use async_trait::async_trait;

/// An owned, exclusive handle to a pooled direct buffer. Dropping it without
/// calling `release` is a handle leak from the pool's point of view; callers
/// must release on every exit path, including error and cancellation (§4.4
/// step 6).
pub trait PooledBuffer: Send {
    /// `capacity >= size` requested at acquire time.
    fn capacity(&self) -> usize;
    fn as_slice(&self) -> &[u8];
    fn as_mut_slice(&mut self) -> &mut [u8];
    /// Opaque identifier of the capacity class and owning pool, used to
    /// detect cross-pool release (§4.1).
    fn class_id(&self) -> u64;
}

#[async_trait]
pub trait BufferPool: Send + Sync {
    /// Returns a buffer with `capacity >= size`, logically empty (position 0,
    /// limit = capacity). `InvalidArgument` for `size == 0`;
    /// `ResourceExhausted` when the configured ceiling is reached and the
    /// pool is not configured to wait; `Closed` after `clear`.
    async fn acquire(&self, size: usize) -> Result<Box<dyn PooledBuffer>, CoreError>;

    /// Resets state and returns `buffer` to its class list.
    /// `InvalidArgument` on a foreign or already-released handle.
    async fn release(&self, buffer: Box<dyn PooledBuffer>) -> Result<(), CoreError>;

    /// Drops all pooled buffers and marks the pool closed; subsequent
    /// `acquire` calls fail with `Closed`.
    async fn clear(&self);

    async fn stats(&self) -> PoolStats;
}

#[async_trait]
impl<T: BufferPool + ?Sized> BufferPool for std::sync::Arc<T> {
    async fn acquire(&self, size: usize) -> Result<Box<dyn PooledBuffer>, CoreError> {
        (**self).acquire(size).await
    }

    async fn release(&self, buffer: Box<dyn PooledBuffer>) -> Result<(), CoreError> {
        (**self).release(buffer).await
    }

    async fn clear(&self) {
        (**self).clear().await
    }

    async fn stats(&self) -> PoolStats {
        (**self).stats().await
    }
}
