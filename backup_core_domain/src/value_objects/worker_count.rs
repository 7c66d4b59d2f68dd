// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Count Value Object
//!
//! A validated worker/thread count together with the empirically-tiered
//! sizing strategy the Worker-Pool Manager (§4.2) and Batch Scheduler (§4.6)
//! use to pick pool widths and per-file concurrency from file size and the
//! number of available CPU cores.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerCount(usize);

impl WorkerCount {
    /// Clamps to at least 1; a pool or dispatch width of 0 would never make
    /// progress.
    pub fn new(count: usize) -> Self {
        Self(count.max(1))
    }

    pub fn count(&self) -> usize {
        self.0
    }

    /// Tiered default by file size, independent of CPU count: tiny files get
    /// a single worker (parallelism overhead would dominate), huge files get
    /// the widest tier.
    pub fn optimal_for_file_size(file_size: u64) -> Self {
        const MIB: u64 = 1024 * 1024;
        match file_size {
            0..=64_000 => Self::new(1),           // tiny: <= ~64 KB
            n if n <= MIB => Self::new(2),        // small
            n if n <= 64 * MIB => Self::new(4),   // medium
            n if n <= 1024 * MIB => Self::new(8), // large
            _ => Self::new(16),                   // huge
        }
    }

    /// Same as [`Self::optimal_for_file_size`] but clamped to the number of
    /// logical cores actually available.
    pub fn optimal_for_file_and_system(file_size: u64, available_cores: usize) -> Self {
        let by_size = Self::optimal_for_file_size(file_size).count();
        Self::new(by_size.min(available_cores.max(1)))
    }

    /// CPU-intensive work (hashing) is capped near the core count; I/O-bound
    /// work can usefully run wider than the core count since workers spend
    /// most of their time blocked on the filesystem.
    pub fn optimal_for_processing_type(file_size: u64, available_cores: usize, is_cpu_intensive: bool) -> Self {
        let base = Self::optimal_for_file_and_system(file_size, available_cores);
        if is_cpu_intensive {
            base
        } else {
            Self::new(base.count() * 2)
        }
    }

    pub fn default_for_system() -> Self {
        Self::new(std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4))
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::default_for_system()
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} workers", self.0)
    }
}

impl From<usize> for WorkerCount {
    fn from(count: usize) -> Self {
        Self::new(count)
    }
}

impl From<WorkerCount> for usize {
    fn from(wc: WorkerCount) -> Self {
        wc.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_clamps_to_one() {
        assert_eq!(WorkerCount::new(0).count(), 1);
    }

    #[test]
    fn tiny_files_get_one_worker() {
        assert_eq!(WorkerCount::optimal_for_file_size(100).count(), 1);
    }

    #[test]
    fn huge_files_get_widest_tier() {
        assert_eq!(WorkerCount::optimal_for_file_size(2 * 1024 * 1024 * 1024).count(), 16);
    }

    #[test]
    fn clamped_to_available_cores() {
        assert_eq!(WorkerCount::optimal_for_file_and_system(u64::MAX, 3).count(), 3);
    }

    #[test]
    fn io_bound_runs_wider_than_cpu_bound() {
        let cpu = WorkerCount::optimal_for_processing_type(10 * 1024 * 1024, 8, true);
        let io = WorkerCount::optimal_for_processing_type(10 * 1024 * 1024, 8, false);
        assert!(io.count() >= cpu.count());
    }
}
