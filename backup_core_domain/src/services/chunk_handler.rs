// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Handler (C3)
//!
//! Computes per-chunk digests using the hash function port (§4.3). Modeled
//! as a sync, CPU-bound domain service — the same split the teacher draws
//! between its sync `ChecksumService`/`ChunkProcessor` and the async
//! infrastructure ports: hashing a byte range does no I/O of its own, so it
//! has no business being `async`.
//!
//! A handler failure aborts the file's chunking operation but never poisons
//! the batch (§4.3 Failure): the caller (File Chunker) is responsible for
//! converting a `ChunkHandlerError` into a per-file `ChunkingResult::Failure`.

use crate::value_objects::Digest;
use crate::CoreError;

#[derive(Debug, Clone)]
pub struct ChunkInput {
    pub index: u64,
    pub total: u64,
    pub bytes: Vec<u8>,
}

/// Hashes chunk byte ranges, one file at a time.
pub trait ChunkHandler: Send + Sync {
    /// Hashes a single chunk. `index`/`total` are carried through for
    /// diagnostics; the digest itself depends only on `bytes`.
    fn process_chunk(&self, bytes: &[u8], index: u64, total: u64, file: &str) -> Result<Digest, CoreError>;

    /// Hashes a slice of chunks, possibly in parallel; digests in the
    /// returned vector are aligned index-for-index with `chunks` (§4.3).
    fn process_chunks(&self, chunks: &[ChunkInput], file: &str) -> Result<Vec<Digest>, CoreError>;

    fn max_concurrent_chunks(&self) -> usize;

    fn set_max_concurrent_chunks(&mut self, max: usize);
}
