// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Snapshot of buffer-pool occupancy (§3 Data Model, §4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolStats {
    pub total: usize,
    pub available: usize,
    pub in_use: usize,
    pub hits: u64,
    pub misses: u64,
}

impl PoolStats {
    /// `in_use + available == total` at quiescence (§3 invariant).
    pub fn is_consistent(&self) -> bool {
        self.in_use + self.available == self.total
    }
}
