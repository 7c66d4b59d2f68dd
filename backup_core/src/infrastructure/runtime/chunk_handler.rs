// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rayon Chunk Handler (C3)
//!
//! Hashes chunk byte ranges using the pluggable [`HashFunction`] port.
//! `process_chunk` does the actual hashing; the caller is responsible for
//! getting it onto a CPU-bound thread — the File Chunker (C4) does this by
//! submitting to the Worker-Pool Manager's [`PoolKind::Cpu`](backup_core_domain::value_objects::PoolKind::Cpu)
//! pool (§4.2/§4.3) rather than this handler owning a thread pool of its
//! own. `process_chunks` fans a whole slice out over rayon's ambient global
//! pool for callers that already hold every chunk's bytes at once. A handler
//! failure aborts only the file that triggered it; the caller (File Chunker)
//! turns it into a per-file `ChunkingResult::Failure`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use backup_core_domain::services::{ChunkHandler, ChunkInput};
use backup_core_domain::value_objects::Digest;
use backup_core_domain::CoreError;
use rayon::prelude::*;

use backup_core_domain::services::HashFunction;

pub struct RayonChunkHandler {
    hash: Arc<dyn HashFunction>,
    max_concurrent_chunks: AtomicUsize,
}

impl RayonChunkHandler {
    pub fn new(hash: Arc<dyn HashFunction>, max_concurrent_chunks: usize) -> Self {
        Self {
            hash,
            max_concurrent_chunks: AtomicUsize::new(max_concurrent_chunks.max(1)),
        }
    }
}

impl ChunkHandler for RayonChunkHandler {
    fn process_chunk(&self, bytes: &[u8], _index: u64, _total: u64, _file: &str) -> Result<Digest, CoreError> {
        Ok(Digest::new(self.hash.digest(bytes)))
    }

    fn process_chunks(&self, chunks: &[ChunkInput], file: &str) -> Result<Vec<Digest>, CoreError> {
        let hash = Arc::clone(&self.hash);
        chunks
            .par_iter()
            .map(|chunk| Ok(Digest::new(hash.digest(&chunk.bytes))))
            .collect::<Result<Vec<Digest>, CoreError>>()
            .map_err(|e: CoreError| CoreError::io_failure(format!("chunk hashing failed for {file}: {e}")))
    }

    fn max_concurrent_chunks(&self) -> usize {
        self.max_concurrent_chunks.load(Ordering::Relaxed)
    }

    fn set_max_concurrent_chunks(&mut self, max: usize) {
        self.max_concurrent_chunks.store(max.max(1), Ordering::Relaxed);
    }
}
