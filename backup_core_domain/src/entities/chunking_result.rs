// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunking Result
//!
//! Outcome of chunking a single file (§3 Data Model, §4.4 File Chunker). Per
//! the "inheritance trees become tagged variants" design note (§9), success
//! and failure are modeled as an enum with explicit constructors rather than
//! a result base class with a `Success`/`Failure` subclass pair.

use crate::value_objects::{Chunk, Digest};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChunkingResult {
    Success {
        path: PathBuf,
        chunk_count: u64,
        total_size: u64,
        /// Bytes detected as holes (all-zero ranges not actually read from
        /// disk). Always 0 in this implementation: sparse-file detection is
        /// an optimization the spec leaves to the implementer (§9 open
        /// question) and is not performed here.
        sparse_size: u64,
        file_digest: Digest,
        chunk_digests: Vec<Chunk>,
    },
    Failure {
        path: PathBuf,
        error: CoreError,
    },
}

impl ChunkingResult {
    pub fn success(
        path: impl Into<PathBuf>,
        total_size: u64,
        file_digest: Digest,
        chunk_digests: Vec<Chunk>,
    ) -> Self {
        Self::Success {
            path: path.into(),
            chunk_count: chunk_digests.len() as u64,
            total_size,
            sparse_size: 0,
            file_digest,
            chunk_digests,
        }
    }

    pub fn failure(path: impl Into<PathBuf>, error: CoreError) -> Self {
        Self::Failure {
            path: path.into(),
            error,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Success { path, .. } | Self::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_chunk_count_matches_digests_len() {
        let result = ChunkingResult::success(
            "a.bin",
            128,
            Digest::new(vec![1, 2, 3]),
            vec![
                Chunk::new(0, 0, 64, Digest::new(vec![0])),
                Chunk::new(1, 64, 64, Digest::new(vec![1])),
            ],
        );
        match result {
            ChunkingResult::Success { chunk_count, chunk_digests, .. } => {
                assert_eq!(chunk_count as usize, chunk_digests.len());
            }
            ChunkingResult::Failure { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn failure_has_no_digest() {
        let result = ChunkingResult::failure("a.bin", CoreError::io_failure("disk error"));
        assert!(!result.is_success());
        assert!(result.error().is_some());
    }
}
