// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Direct Buffer Pool (C1)
//!
//! Size-classed free list of reusable `Vec<u8>` buffers (§4.1). Classes are a
//! power-of-two progression from `min_class_bytes` to `max_class_bytes`;
//! `acquire` rounds a requested size up to the smallest class that fits it.
//! The pool-wide ceiling is a buffer *count*, not a byte budget, matching the
//! `{class=8 KiB, max=2}` example in spec §8 scenario 6.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backup_core_domain::entities::PoolStats;
use backup_core_domain::services::{BufferPool, PooledBuffer};
use backup_core_domain::CoreError;
use parking_lot::Mutex;
use tokio::sync::Notify;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy)]
pub struct BufferPoolConfig {
    /// Smallest capacity class handed out; requests below this are rounded up.
    pub min_class_bytes: usize,
    /// Largest capacity class the pool will allocate; requests above this
    /// fail with `InvalidArgument` rather than being silently truncated.
    pub max_class_bytes: usize,
    /// Ceiling on the number of buffers outstanding across every class at
    /// once.
    pub max_buffers: usize,
    /// When the ceiling is reached: wait for a release (bounded by
    /// `acquire_timeout` if set) instead of failing immediately.
    pub wait_on_exhaustion: bool,
    pub acquire_timeout: Option<Duration>,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            min_class_bytes: 1024,
            max_class_bytes: 1024 * 1024,
            max_buffers: 64,
            wait_on_exhaustion: true,
            acquire_timeout: Some(Duration::from_secs(30)),
        }
    }
}

struct DirectBuffer {
    data: Vec<u8>,
    class_bytes: usize,
    /// Encodes (owning pool id, class index) so `release` can reject a
    /// foreign or cross-pool handle (§4.1).
    class_id: u64,
}

impl PooledBuffer for DirectBuffer {
    fn capacity(&self) -> usize {
        self.class_bytes
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn class_id(&self) -> u64 {
        self.class_id
    }
}

struct PoolInner {
    config: BufferPoolConfig,
    free_lists: Mutex<HashMap<usize, Vec<Box<dyn PooledBuffer>>>>,
    outstanding: AtomicUsize,
    total_created: AtomicUsize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    closed: AtomicBool,
    notify: Notify,
    pool_id: u64,
}

/// Thread-safe, size-classed buffer pool (§4.1 C1). Clone is cheap: it shares
/// the same underlying state via `Arc`.
#[derive(Clone)]
pub struct DirectBufferPool {
    inner: Arc<PoolInner>,
}

impl DirectBufferPool {
    pub fn new(config: BufferPoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                config,
                free_lists: Mutex::new(HashMap::new()),
                outstanding: AtomicUsize::new(0),
                total_created: AtomicUsize::new(0),
                hits: AtomicUsize::new(0),
                misses: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                notify: Notify::new(),
                pool_id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    fn class_for(&self, size: usize) -> Result<usize, CoreError> {
        if size == 0 {
            return Err(CoreError::invalid_argument("buffer size must be at least 1 byte"));
        }
        let cfg = &self.inner.config;
        let mut class = cfg.min_class_bytes;
        while class < size && class < cfg.max_class_bytes {
            class = class.saturating_mul(2).min(cfg.max_class_bytes);
        }
        if class < size {
            return Err(CoreError::invalid_argument(format!(
                "requested buffer size {size} exceeds the pool's maximum class of {}",
                cfg.max_class_bytes
            )));
        }
        Ok(class)
    }

    fn class_index(&self, class_bytes: usize) -> u32 {
        let mut idx = 0u32;
        let mut c = self.inner.config.min_class_bytes;
        while c < class_bytes {
            c *= 2;
            idx += 1;
        }
        idx
    }

    fn class_id_for(&self, class_bytes: usize) -> u64 {
        (self.inner.pool_id << 32) | self.class_index(class_bytes) as u64
    }

    fn try_take(&self, class: usize) -> Option<Box<dyn PooledBuffer>> {
        self.inner.free_lists.lock().get_mut(&class).and_then(Vec::pop)
    }
}

#[async_trait]
impl BufferPool for DirectBufferPool {
    async fn acquire(&self, size: usize) -> Result<Box<dyn PooledBuffer>, CoreError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(CoreError::closed("buffer pool is closed"));
        }
        let class = self.class_for(size)?;
        let class_id = self.class_id_for(class);

        loop {
            if self.inner.closed.load(Ordering::SeqCst) {
                return Err(CoreError::closed("buffer pool is closed"));
            }

            if let Some(reused) = self.try_take(class) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                self.inner.outstanding.fetch_add(1, Ordering::Relaxed);
                return Ok(reused);
            }

            let outstanding = self.inner.outstanding.load(Ordering::SeqCst);
            if outstanding < self.inner.config.max_buffers {
                self.inner.outstanding.fetch_add(1, Ordering::Relaxed);
                self.inner.total_created.fetch_add(1, Ordering::Relaxed);
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(Box::new(DirectBuffer {
                    data: vec![0u8; class],
                    class_bytes: class,
                    class_id,
                }));
            }

            if !self.inner.config.wait_on_exhaustion {
                return Err(CoreError::resource_exhausted(format!(
                    "buffer pool exhausted: {outstanding}/{} buffers outstanding",
                    self.inner.config.max_buffers
                )));
            }

            let notified = self.inner.notify.notified();
            match self.inner.config.acquire_timeout {
                Some(timeout) => {
                    if tokio::time::timeout(timeout, notified).await.is_err() {
                        return Err(CoreError::timed_out("timed out waiting for a free buffer"));
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn release(&self, mut buffer: Box<dyn PooledBuffer>) -> Result<(), CoreError> {
        let owning_pool = buffer.class_id() >> 32;
        if owning_pool != self.inner.pool_id {
            return Err(CoreError::invalid_argument("buffer was released to a pool that did not allocate it"));
        }

        let class_bytes = buffer.capacity();
        buffer.as_mut_slice().iter_mut().for_each(|b| *b = 0);

        self.inner
            .free_lists
            .lock()
            .entry(class_bytes)
            .or_default()
            .push(buffer);
        self.inner.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.inner.notify.notify_one();
        Ok(())
    }

    async fn clear(&self) {
        self.inner.free_lists.lock().clear();
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    async fn stats(&self) -> PoolStats {
        let available: usize = self.inner.free_lists.lock().values().map(Vec::len).sum();
        let total = self.inner.total_created.load(Ordering::Relaxed);
        PoolStats {
            total,
            available,
            in_use: self.inner.outstanding.load(Ordering::Relaxed),
            hits: self.inner.hits.load(Ordering::Relaxed) as u64,
            misses: self.inner.misses.load(Ordering::Relaxed) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_rejects_zero_size() {
        let pool = DirectBufferPool::new(BufferPoolConfig::default());
        let err = pool.acquire(0).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn acquire_rounds_up_to_class_and_release_round_trips() {
        let pool = DirectBufferPool::new(BufferPoolConfig {
            min_class_bytes: 1024,
            max_class_bytes: 8192,
            max_buffers: 4,
            wait_on_exhaustion: false,
            acquire_timeout: None,
        });

        let buf = pool.acquire(100).await.unwrap();
        assert_eq!(buf.capacity(), 1024);
        pool.release(buf).await.unwrap();

        let stats = pool.stats().await;
        assert!(stats.is_consistent());
        assert_eq!(stats.in_use, 0);
    }

    #[tokio::test]
    async fn exhaustion_without_waiting_fails_fast() {
        let pool = DirectBufferPool::new(BufferPoolConfig {
            min_class_bytes: 8192,
            max_class_bytes: 8192,
            max_buffers: 2,
            wait_on_exhaustion: false,
            acquire_timeout: None,
        });

        let a = pool.acquire(8192).await.unwrap();
        let b = pool.acquire(8192).await.unwrap();
        let err = pool.acquire(8192).await.unwrap_err();
        assert!(matches!(err, CoreError::ResourceExhausted(_)));

        pool.release(a).await.unwrap();
        pool.release(b).await.unwrap();
    }

    #[tokio::test]
    async fn waiter_succeeds_after_release() {
        let pool = DirectBufferPool::new(BufferPoolConfig {
            min_class_bytes: 8192,
            max_class_bytes: 8192,
            max_buffers: 1,
            wait_on_exhaustion: true,
            acquire_timeout: Some(Duration::from_secs(2)),
        });

        let held = pool.acquire(8192).await.unwrap();

        let pool_clone = pool.clone();
        let waiter = tokio::spawn(async move { pool_clone.acquire(8192).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.release(held).await.unwrap();

        let acquired = waiter.await.unwrap();
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn size_above_max_class_is_invalid_argument() {
        let pool = DirectBufferPool::new(BufferPoolConfig {
            min_class_bytes: 1024,
            max_class_bytes: 2048,
            max_buffers: 4,
            wait_on_exhaustion: false,
            acquire_timeout: None,
        });
        let err = pool.acquire(4096).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn cross_pool_release_is_rejected() {
        let pool_a = DirectBufferPool::new(BufferPoolConfig::default());
        let pool_b = DirectBufferPool::new(BufferPoolConfig::default());

        let buf = pool_a.acquire(1024).await.unwrap();
        let err = pool_b.release(buf).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn clear_closes_pool() {
        let pool = DirectBufferPool::new(BufferPoolConfig::default());
        pool.clear().await;
        let err = pool.acquire(1024).await.unwrap_err();
        assert!(matches!(err, CoreError::Closed(_)));
    }
}
