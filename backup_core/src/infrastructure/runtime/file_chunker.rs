// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Overlapped File Chunker (C4)
//!
//! Drives whole-file chunking end to end (§4.4): acquires buffers from the
//! buffer pool, issues positional reads on the worker-pool manager's Io pool,
//! hands each chunk to the chunk handler for hashing on the same manager's
//! Cpu pool, and folds the results into the whole-file digest in strict
//! index order regardless of the order reads complete in.
//!
//! Ordering is kept by a small reorder buffer (`pending`): a completed
//! chunk keeps its pooled buffer alive and held in `pending` until every
//! lower index has been folded, then releases it back to the pool right
//! after the fold — the read target and the hash source are the same
//! memory the whole way through, never copied.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backup_core_domain::entities::ChunkingResult;
use backup_core_domain::services::{digest_of_empty, BufferPool, ChunkHandler, FileChunker, HashFunction, PoolTask, PooledBuffer, WorkerPoolManager};
use backup_core_domain::value_objects::{Chunk, ChunkingOptions, Digest, PoolKind, TaskPriority};
use backup_core_domain::CoreError;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// How long `close()` waits for in-flight `chunk_file` calls to drain before
/// returning anyway (§4.4 Shutdown: "a grace window, then canceled").
const CLOSE_GRACE: Duration = Duration::from_secs(2);

pub struct OverlappedFileChunker {
    buffer_pool: Arc<dyn BufferPool>,
    chunk_handler: Arc<dyn ChunkHandler>,
    hash_function: Arc<dyn HashFunction>,
    worker_pool: Arc<dyn WorkerPoolManager>,
    closed: AtomicBool,
    in_flight: AtomicU64,
}

impl OverlappedFileChunker {
    pub fn new(
        buffer_pool: Arc<dyn BufferPool>,
        chunk_handler: Arc<dyn ChunkHandler>,
        hash_function: Arc<dyn HashFunction>,
        worker_pool: Arc<dyn WorkerPoolManager>,
    ) -> Self {
        Self {
            buffer_pool,
            chunk_handler,
            hash_function,
            worker_pool,
            closed: AtomicBool::new(false),
            in_flight: AtomicU64::new(0),
        }
    }

    /// Runs a blocking closure on the named worker pool and pulls its typed
    /// result back out through a shared slot, since [`PoolTask`] itself is
    /// object-safe only over `Result<(), CoreError>`. Positional reads go to
    /// [`PoolKind::Io`]; chunk hashing goes to [`PoolKind::Cpu`] (§4.2/§4.3) —
    /// this is the one dispatch surface both pools actually receive work
    /// through.
    async fn run_on_pool<T, F>(&self, kind: PoolKind, f: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    {
        let slot: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
        let slot_for_task = Arc::clone(&slot);
        let task: PoolTask = Box::new(move || {
            let value = f()?;
            *slot_for_task.lock() = Some(value);
            Ok(())
        });
        self.worker_pool.submit(kind, TaskPriority::Normal, task).await?;
        slot.lock()
            .take()
            .ok_or_else(|| CoreError::internal(format!("{kind} pool task completed without producing a result")))
    }

    #[allow(clippy::too_many_arguments)]
    async fn read_and_hash_one(
        &self,
        path: Arc<PathBuf>,
        label: Arc<str>,
        index: u64,
        count: u64,
        offset: u64,
        len: usize,
        chunk_size: usize,
    ) -> Result<(u64, Chunk, Box<dyn PooledBuffer>), CoreError> {
        let buffer = self.buffer_pool.acquire(chunk_size).await?;

        // The buffer itself (not a freshly allocated `Vec`) is the read
        // target: it travels into the IO-pool closure and back out again so
        // the positional read lands straight in pooled memory.
        let read_path = Arc::clone(&path);
        let (mut buffer, read_result) = self
            .run_on_pool(PoolKind::Io, move || {
                use std::io::{Read, Seek, SeekFrom};
                let mut buffer = buffer;
                let outcome: Result<(), CoreError> = (|| {
                    let mut file = std::fs::File::open(read_path.as_path())?;
                    file.seek(SeekFrom::Start(offset))?;
                    file.read_exact(&mut buffer.as_mut_slice()[..len]).map_err(|e| {
                        if e.kind() == std::io::ErrorKind::UnexpectedEof {
                            CoreError::io_failure(format!(
                                "short read for {}: expected {len} bytes at offset {offset}",
                                read_path.display()
                            ))
                        } else {
                            CoreError::from(e)
                        }
                    })
                })();
                Ok((buffer, outcome))
            })
            .await?;

        if let Err(e) = read_result {
            self.buffer_pool.release(buffer).await.ok();
            return Err(e);
        }

        // Hashing is CPU-bound, so it goes to the Cpu pool too, rather than
        // running inline on whatever thread is driving this future.
        let chunk_handler = Arc::clone(&self.chunk_handler);
        let label_for_hash = Arc::clone(&label);
        let (buffer, digest_result) = self
            .run_on_pool(PoolKind::Cpu, move || {
                let buffer = buffer;
                let digest = chunk_handler.process_chunk(&buffer.as_slice()[..len], index, count, &label_for_hash);
                Ok((buffer, digest))
            })
            .await?;

        let digest = match digest_result {
            Ok(d) => d,
            Err(e) => {
                self.buffer_pool.release(buffer).await.ok();
                return Err(e);
            }
        };

        Ok((index, Chunk::new(index, offset, len as u64, digest), buffer))
    }
}

#[async_trait]
impl FileChunker for OverlappedFileChunker {
    async fn chunk_file(&self, path: &Path, options: &ChunkingOptions) -> Result<ChunkingResult, CoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::closed("file chunker has been closed"));
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.chunk_file_inner(path, options).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let deadline = tokio::time::Instant::now() + CLOSE_GRACE;
        while self.in_flight.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            warn!(
                in_flight = self.in_flight.load(Ordering::SeqCst),
                "file chunker closed with operations still in flight past the grace window"
            );
        }
    }
}

impl OverlappedFileChunker {
    async fn chunk_file_inner(&self, path: &Path, options: &ChunkingOptions) -> Result<ChunkingResult, CoreError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) => return Ok(ChunkingResult::failure(path, CoreError::from(e))),
        };
        if !metadata.is_file() {
            return Ok(ChunkingResult::failure(
                path,
                CoreError::invalid_argument(format!("{} is not a regular file", path.display())),
            ));
        }

        let file_size = metadata.len();
        if file_size == 0 {
            let empty_digest = Digest::new(digest_of_empty(self.hash_function.as_ref()));
            return Ok(ChunkingResult::success(path, 0, empty_digest, Vec::new()));
        }

        let chunk_size_obj = options.chunk_size();
        let chunk_size = chunk_size_obj.bytes();
        let count = chunk_size_obj.chunk_count(file_size);
        let last_len = chunk_size_obj.last_chunk_length(file_size) as usize;

        let window = if options.should_use_async_io(file_size) {
            options.max_concurrent_chunks().max(1)
        } else {
            1
        };

        debug!(path = %path.display(), file_size, count, window, "chunking file");

        let path_arc = Arc::new(path.to_path_buf());
        let label: Arc<str> = Arc::from(path.display().to_string());

        // Bounded in-flight window (§4.4 step 2): at most `window` reads are
        // ever in progress, via `FuturesUnordered` rather than `tokio::spawn`
        // so every future can simply borrow `self` instead of needing a
        // `'static` bound.
        let mut in_flight = FuturesUnordered::new();
        let mut next_to_submit = 0u64;
        let spawn_one = |index: u64| {
            let offset = index * chunk_size as u64;
            let len = if index + 1 == count { last_len } else { chunk_size };
            self.read_and_hash_one(Arc::clone(&path_arc), Arc::clone(&label), index, count, offset, len, chunk_size)
        };
        while next_to_submit < count && (in_flight.len() as u64) < window as u64 {
            in_flight.push(spawn_one(next_to_submit));
            next_to_submit += 1;
        }

        let mut pending: BTreeMap<u64, (Chunk, Box<dyn PooledBuffer>)> = BTreeMap::new();
        let mut chunk_digests: Vec<Chunk> = Vec::with_capacity(count as usize);
        let mut whole_file_hasher = self.hash_function.incremental();
        let mut next_to_fold = 0u64;

        while let Some(item) = in_flight.next().await {
            match item {
                Ok((index, chunk, buffer)) => {
                    pending.insert(index, (chunk, buffer));
                    while let Some((chunk, buffer)) = pending.remove(&next_to_fold) {
                        let chunk_len = chunk.length() as usize;
                        whole_file_hasher.update(&buffer.as_slice()[..chunk_len]);
                        self.buffer_pool.release(buffer).await.ok();
                        chunk_digests.push(chunk);
                        next_to_fold += 1;
                    }
                }
                Err(e) => {
                    // Every exit path releases what it's holding, including
                    // completions that were only waiting on an earlier index
                    // (§4.4 step 6).
                    for (_, buffer) in pending.into_values() {
                        self.buffer_pool.release(buffer).await.ok();
                    }
                    return Ok(ChunkingResult::failure(path, e));
                }
            }
            if next_to_submit < count {
                in_flight.push(spawn_one(next_to_submit));
                next_to_submit += 1;
            }
        }

        if next_to_fold != count {
            return Ok(ChunkingResult::failure(
                path,
                CoreError::internal("a chunking task ended without producing a result"),
            ));
        }

        let file_digest = Digest::new(whole_file_hasher.finalize());
        Ok(ChunkingResult::success(path, file_size, file_digest, chunk_digests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runtime::buffer_pool::{BufferPoolConfig, DirectBufferPool};
    use crate::infrastructure::runtime::chunk_handler::RayonChunkHandler;
    use crate::infrastructure::runtime::hash_function::Sha256HashFunction;
    use crate::infrastructure::runtime::worker_pool::RayonWorkerPoolManager;
    use backup_core_domain::value_objects::ChunkSize;
    use std::io::Write;

    fn chunker() -> OverlappedFileChunker {
        let buffer_pool = Arc::new(DirectBufferPool::new(BufferPoolConfig::default()));
        let hash = Arc::new(Sha256HashFunction);
        let chunk_handler = Arc::new(RayonChunkHandler::new(hash.clone(), 4));
        let worker_pool = Arc::new(RayonWorkerPoolManager::new(4, 4, None));
        OverlappedFileChunker::new(buffer_pool, chunk_handler, hash, worker_pool)
    }

    fn write_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[tokio::test]
    async fn zero_length_file_has_zero_chunks_and_empty_digest() {
        let chunker = chunker();
        let f = write_file(b"");
        let opts = ChunkingOptions::default();
        let result = chunker.chunk_file(f.path(), &opts).await.unwrap();
        match result {
            ChunkingResult::Success { chunk_count, file_digest, .. } => {
                assert_eq!(chunk_count, 0);
                assert_eq!(file_digest, Digest::new(digest_of_empty(&Sha256HashFunction)));
            }
            ChunkingResult::Failure { error, .. } => panic!("expected success, got {error:?}"),
        }
    }

    #[tokio::test]
    async fn chunk_count_and_last_length_match_spec_example() {
        let chunker = chunker();
        let data = vec![7u8; 200 * 1024];
        let f = write_file(&data);
        let opts = ChunkingOptions::builder()
            .chunk_size(ChunkSize::new(64 * 1024).unwrap())
            .use_async_io(false)
            .build();
        let result = chunker.chunk_file(f.path(), &opts).await.unwrap();
        match result {
            ChunkingResult::Success { chunk_count, chunk_digests, .. } => {
                assert_eq!(chunk_count, 4);
                assert_eq!(chunk_digests.last().unwrap().length(), 8 * 1024);
            }
            ChunkingResult::Failure { error, .. } => panic!("expected success, got {error:?}"),
        }
    }

    #[tokio::test]
    async fn chunk_digests_reproduce_byte_ranges_in_order() {
        let chunker = chunker();
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let f = write_file(&data);
        let opts = ChunkingOptions::builder()
            .chunk_size(ChunkSize::new(1000).unwrap())
            .max_concurrent_chunks(4)
            .use_async_io(true)
            .build();
        let result = chunker.chunk_file(f.path(), &opts).await.unwrap();
        match result {
            ChunkingResult::Success { chunk_digests, file_digest, .. } => {
                let hash = Sha256HashFunction;
                for (i, chunk) in chunk_digests.iter().enumerate() {
                    assert_eq!(chunk.index(), i as u64);
                    let range = chunk.byte_range();
                    let expected = hash.digest(&data[range.start as usize..range.end as usize]);
                    assert_eq!(chunk.digest(), &Digest::new(expected));
                }
                assert_eq!(file_digest, Digest::new(hash.digest(&data)));
            }
            ChunkingResult::Failure { error, .. } => panic!("expected success, got {error:?}"),
        }
    }

    #[tokio::test]
    async fn degenerate_chunk_size_of_one_completes() {
        let chunker = chunker();
        let f = write_file(b"hello");
        let opts = ChunkingOptions::builder()
            .chunk_size(ChunkSize::new(1).unwrap())
            .use_async_io(false)
            .build();
        let result = chunker.chunk_file(f.path(), &opts).await.unwrap();
        match result {
            ChunkingResult::Success { chunk_count, .. } => assert_eq!(chunk_count, 5),
            ChunkingResult::Failure { error, .. } => panic!("expected success, got {error:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_a_per_file_failure_not_an_error() {
        let chunker = chunker();
        let opts = ChunkingOptions::default();
        let result = chunker
            .chunk_file(Path::new("/definitely/does/not/exist.bin"), &opts)
            .await
            .unwrap();
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn closed_chunker_rejects_new_work() {
        let chunker = chunker();
        chunker.close().await;
        let f = write_file(b"data");
        let err = chunker.chunk_file(f.path(), &ChunkingOptions::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::Closed(_)));
    }
}
