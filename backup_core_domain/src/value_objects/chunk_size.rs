// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Size Value Object
//!
//! A validated, immutable byte count used both as the fixed chunking unit
//! (§4.4 File Chunker) and as a buffer-pool capacity class (§4.1 Buffer
//! Pool). A `ChunkSize` of zero is rejected at construction: degenerate chunk
//! sizes would make `File Chunker` loop forever trying to make progress.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default chunk size (64 KiB) used when the caller does not override it.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound accepted by [`ChunkSize::new`]. Chosen generously; this is a
/// sanity ceiling, not a performance-tuned limit.
pub const MAX_CHUNK_SIZE: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Validates `bytes` is in `1..=MAX_CHUNK_SIZE`.
    pub fn new(bytes: usize) -> Result<Self, CoreError> {
        if bytes == 0 {
            return Err(CoreError::invalid_argument("chunk size must be at least 1 byte"));
        }
        if bytes > MAX_CHUNK_SIZE {
            return Err(CoreError::invalid_argument(format!(
                "chunk size {bytes} exceeds maximum of {MAX_CHUNK_SIZE} bytes"
            )));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> usize {
        self.0
    }

    /// Number of chunks a file of `file_size` bytes splits into:
    /// `ceil(file_size / self)`, or 0 for an empty file.
    pub fn chunk_count(&self, file_size: u64) -> u64 {
        if file_size == 0 {
            return 0;
        }
        file_size.div_ceil(self.0 as u64)
    }

    /// Byte length of the last chunk for a file of `file_size` bytes.
    /// Returns 0 if `file_size` is 0.
    pub fn last_chunk_length(&self, file_size: u64) -> u64 {
        let count = self.chunk_count(file_size);
        if count == 0 {
            return 0;
        }
        file_size - (count - 1) * self.0 as u64
    }

    /// Byte offset of chunk `index` within the file.
    pub fn offset_of(&self, index: u64) -> u64 {
        index * self.0 as u64
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(DEFAULT_CHUNK_SIZE)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = CoreError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero() {
        assert!(ChunkSize::new(0).is_err());
    }

    #[test]
    fn rejects_over_max() {
        assert!(ChunkSize::new(MAX_CHUNK_SIZE + 1).is_err());
    }

    #[test]
    fn count_and_last_length_match_spec_examples() {
        let cs = ChunkSize::new(64 * 1024).unwrap();
        let file_size = 200 * 1024;
        assert_eq!(cs.chunk_count(file_size), 4);
        assert_eq!(cs.last_chunk_length(file_size), 8 * 1024);
    }

    #[test]
    fn boundary_sizes() {
        let cs = ChunkSize::new(100).unwrap();
        assert_eq!(cs.chunk_count(0), 0);
        assert_eq!(cs.chunk_count(100), 1);
        assert_eq!(cs.last_chunk_length(100), 100);
        assert_eq!(cs.chunk_count(101), 2);
        assert_eq!(cs.last_chunk_length(101), 1);
        assert_eq!(cs.chunk_count(99), 1);
        assert_eq!(cs.last_chunk_length(99), 99);
    }

    #[test]
    fn degenerate_chunk_size_of_one() {
        let cs = ChunkSize::new(1).unwrap();
        assert_eq!(cs.chunk_count(5), 5);
        assert_eq!(cs.last_chunk_length(5), 1);
    }
}
