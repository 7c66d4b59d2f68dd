// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Backup Core
//!
//! The scanning-and-chunking core of a content-addressed backup engine:
//! walks a directory tree, content-defined-chunks every file it finds, and
//! hands chunk digests to a pluggable store. This crate is the
//! infrastructure and presentation layers over the component contracts
//! (domain entities, value objects, and ports) defined in
//! `backup_core_domain`.
//!
//! ## Architecture Overview
//!
//! This crate follows the same Clean Architecture split as its domain
//! counterpart, minus the domain layer itself:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Presentation Layer (this crate)             │
//! │  (scan command orchestration, manifest, error reporting)    │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Infrastructure Layer (this crate)              │
//! │  (buffer pool, worker pool, file chunker, scanner, ...)      │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Domain Layer (backup_core_domain)               │
//! │  (entities, value objects, component ports, CoreError)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Components
//!
//! | Port (domain)          | Adapter (this crate)                              |
//! |-------------------------|----------------------------------------------------|
//! | `BufferPool`            | `infrastructure::runtime::buffer_pool::DirectBufferPool` |
//! | `WorkerPoolManager`     | `infrastructure::runtime::worker_pool::RayonWorkerPoolManager` |
//! | `ChunkHandler`          | `infrastructure::runtime::chunk_handler::RayonChunkHandler` |
//! | `FileChunker`           | `infrastructure::runtime::file_chunker::OverlappedFileChunker` |
//! | `FilesystemScanner`     | `infrastructure::scanner::WalkdirScanner`          |
//! | `BatchScheduler`        | `infrastructure::runtime::batch_scheduler::DefaultBatchScheduler` |
//! | `ChunkStore`            | `infrastructure::runtime::chunk_store::{FsChunkStore, InMemoryChunkStore}` |
//! | `HashFunction`          | `infrastructure::runtime::hash_function::Sha256HashFunction` |
//!
//! ## Ambient Concerns
//!
//! - **Configuration**: `infrastructure::config::CoreConfig` layers built-in
//!   defaults, an optional TOML file, and `BACKUP_*` environment variables.
//! - **Logging**: `infrastructure::logging::init_logging` installs a
//!   `tracing-subscriber` subscriber; every adapter logs through `tracing`.
//! - **Metrics**: `infrastructure::metrics::MetricsService` exposes Prometheus
//!   counters/gauges/histograms for pool throughput, batch duration, and
//!   buffer-pool hit rate.
//! - **Manifest**: `infrastructure::manifest::ManifestWriter` persists the
//!   scan's output records (binary length-prefixed or line-delimited JSON).
//!
//! ## Error Handling
//!
//! Every fallible operation returns `backup_core_domain::CoreError`. Per-file
//! and per-entry failures are captured in the owning result type instead
//! (`ChunkingResult::Failure`, `ScanResult::errors`) and never abort the scan.
//!
//! ## Testing
//!
//! ```bash
//! cargo test -p backup-core
//! ```

pub mod infrastructure;
pub mod presentation;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory
