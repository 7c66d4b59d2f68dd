// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects: small, immutable, validated types with no identity of
//! their own, shared across every component (§3 Data Model).

pub mod batch_strategy;
pub mod chunk;
pub mod chunk_size;
pub mod chunking_options;
pub mod digest;
pub mod file_record;
pub mod performance_grade;
pub mod pool_kind;
pub mod priority;
pub mod scan_options;
pub mod symlink_policy;
pub mod worker_count;

pub use batch_strategy::BatchStrategy;
pub use chunk::Chunk;
pub use chunk_size::ChunkSize;
pub use chunking_options::ChunkingOptions;
pub use digest::Digest;
pub use file_record::{FileAttrs, FileRecord};
pub use performance_grade::PerformanceGrade;
pub use pool_kind::PoolKind;
pub use priority::{Priority, TaskPriority};
pub use scan_options::ScanOptions;
pub use symlink_policy::SymlinkPolicy;
pub use worker_count::WorkerCount;
