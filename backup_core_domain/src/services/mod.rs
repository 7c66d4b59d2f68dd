// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain services: pure sync business logic (`ChunkHandler`) and the
//! infrastructure ports that remain async because they front I/O
//! (`BufferPool`, `WorkerPoolManager`, `FileChunker`, `FilesystemScanner`,
//! `BatchScheduler`, `ChunkStore`). See the domain-vs-infrastructure split
//! documented in the crate root.

pub mod batch_scheduler;
pub mod buffer_pool;
pub mod chunk_handler;
pub mod chunk_store;
pub mod file_chunker;
pub mod hash_function;
pub mod scanner;
pub mod worker_pool_manager;

pub use batch_scheduler::{BatchScheduler, BatchSchedulerConfig};
pub use buffer_pool::{BufferPool, PooledBuffer};
pub use chunk_handler::{ChunkHandler, ChunkInput};
pub use chunk_store::ChunkStore;
pub use file_chunker::{ChunkerState, FileChunker};
pub use hash_function::{digest_of_empty, HashFunction, IncrementalHash};
pub use scanner::{FilesystemScanner, NullScanVisitor, ScanDirective, ScanVisitor};
pub use worker_pool_manager::{PoolTask, PoolThroughputStats, WorkerPoolManager};
