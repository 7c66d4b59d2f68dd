// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entities: objects with lifecycle and a terminal state, as opposed to the
//! pure value objects in `value_objects` (§3 Data Model).

pub mod batch;
pub mod batch_metrics;
pub mod batch_result;
pub mod chunking_result;
pub mod pool_stats;
pub mod scan_result;

pub use batch::Batch;
pub use batch_metrics::BatchMetrics;
pub use batch_result::BatchResult;
pub use chunking_result::ChunkingResult;
pub use pool_stats::PoolStats;
pub use scan_result::{ScanEntryError, ScanResult};
