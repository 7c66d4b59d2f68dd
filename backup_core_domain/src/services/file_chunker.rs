// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Chunker Port (C4)
//!
//! Drives whole-file chunking end-to-end: acquires buffers from C1, issues
//! overlapped reads, submits hash tasks to C3, and assembles an ordered
//! `ChunkingResult` (§4.4). Modeled as an async infrastructure port since
//! every step is I/O-bound, mirroring the teacher's `FileIOService`.

use crate::entities::ChunkingResult;
use crate::value_objects::ChunkingOptions;
use crate::CoreError;
use async_trait::async_trait;
use std::path::Path;

/// Lifecycle states a chunker instance moves through for a single file
/// (§4.4): `New -> Opened -> Reading <-> Hashing -> Finalized | Failed |
/// Canceled`. The component itself (not a single file) additionally has a
/// `Closed` terminal state reached via `close()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkerState {
    New,
    Opened,
    Reading,
    Hashing,
    Finalized,
    Failed,
    Canceled,
}

#[async_trait]
pub trait FileChunker: Send + Sync {
    /// Chunks one file according to `options`. Never returns `Err` for
    /// per-file problems — those come back as `ChunkingResult::Failure` — but
    /// does return `Err` if the chunker itself has been closed.
    async fn chunk_file(&self, path: &Path, options: &ChunkingOptions) -> Result<ChunkingResult, CoreError>;

    /// Transitions the chunker to `Closed`; subsequent `chunk_file` calls
    /// fail with `Closed`. In-flight operations are given a grace window to
    /// finish before being canceled.
    async fn close(&self);
}
