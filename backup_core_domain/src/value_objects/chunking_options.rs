// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunking Options
//!
//! Immutable configuration for a single chunking operation (§3 Data Model,
//! "Chunking options"). Built once via [`ChunkingOptions::builder`] and handed
//! to the File Chunker; never mutated mid-operation.

use crate::value_objects::ChunkSize;
use serde::{Deserialize, Serialize};

/// File size above which overlapped async reads are used instead of a single
/// sequential read, per §4.4 step 2.
pub const ASYNC_IO_THRESHOLD_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    chunk_size: ChunkSize,
    max_concurrent_chunks: usize,
    use_async_io: bool,
}

impl ChunkingOptions {
    pub fn builder() -> ChunkingOptionsBuilder {
        ChunkingOptionsBuilder::default()
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    pub fn max_concurrent_chunks(&self) -> usize {
        self.max_concurrent_chunks
    }

    pub fn use_async_io(&self) -> bool {
        self.use_async_io
    }

    /// Whether a file of `file_size` bytes should use overlapped async reads
    /// under these options.
    pub fn should_use_async_io(&self, file_size: u64) -> bool {
        self.use_async_io && file_size >= ASYNC_IO_THRESHOLD_BYTES
    }
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        ChunkingOptionsBuilder::default().build()
    }
}

#[derive(Debug, Clone)]
pub struct ChunkingOptionsBuilder {
    chunk_size: ChunkSize,
    max_concurrent_chunks: usize,
    use_async_io: bool,
}

impl Default for ChunkingOptionsBuilder {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            max_concurrent_chunks: 4,
            use_async_io: true,
        }
    }
}

impl ChunkingOptionsBuilder {
    pub fn chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn max_concurrent_chunks(mut self, n: usize) -> Self {
        self.max_concurrent_chunks = n.max(1);
        self
    }

    pub fn use_async_io(mut self, enabled: bool) -> Self {
        self.use_async_io = enabled;
        self
    }

    pub fn build(self) -> ChunkingOptions {
        ChunkingOptions {
            chunk_size: self.chunk_size,
            max_concurrent_chunks: self.max_concurrent_chunks,
            use_async_io: self.use_async_io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let opts = ChunkingOptions::default();
        assert!(opts.max_concurrent_chunks() >= 1);
        assert!(opts.use_async_io());
    }

    #[test]
    fn async_io_only_above_threshold() {
        let opts = ChunkingOptions::builder().use_async_io(true).build();
        assert!(!opts.should_use_async_io(ASYNC_IO_THRESHOLD_BYTES - 1));
        assert!(opts.should_use_async_io(ASYNC_IO_THRESHOLD_BYTES));
    }

    #[test]
    fn max_concurrent_chunks_floors_at_one() {
        let opts = ChunkingOptions::builder().max_concurrent_chunks(0).build();
        assert_eq!(opts.max_concurrent_chunks(), 1);
    }
}
