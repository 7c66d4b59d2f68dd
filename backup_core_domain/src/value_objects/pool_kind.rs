// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pool Kind
//!
//! Names the five worker pools plus the housekeeping pool owned by the
//! Worker-Pool Manager (§4.2 C2).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    /// Blocking file reads/writes; sized wide relative to CPU count.
    Io,
    /// Chunk hashing and other CPU-bound work; capped near logical-CPU count.
    Cpu,
    /// Result assembly and callback dispatch once chunks/batches finish.
    Completion,
    /// Batch-level dispatch and bookkeeping.
    Batch,
    /// Filesystem-change watchers (optional capability, see §9 thread-affinity
    /// note; not exercised by the scan-once CLI flow but reserved for a
    /// future incremental-rescan mode which is explicitly out of scope here).
    Watch,
    /// Small pool for adaptive-resize evaluation and pool-wide housekeeping.
    Management,
}

impl PoolKind {
    pub const ALL: [PoolKind; 6] = [
        PoolKind::Io,
        PoolKind::Cpu,
        PoolKind::Completion,
        PoolKind::Batch,
        PoolKind::Watch,
        PoolKind::Management,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Cpu => "cpu",
            Self::Completion => "completion",
            Self::Batch => "batch",
            Self::Watch => "watch",
            Self::Management => "management",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
