// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # backup-core-domain
//!
//! Pure, reusable domain layer for the scanning-and-chunking core of a
//! content-addressed backup engine, following Domain-Driven Design and
//! Clean Architecture principles the way the rest of this workspace does:
//!
//! - **`value_objects`** — small immutable types with no identity
//!   (`Digest`, `ChunkSize`, `Chunk`, `ChunkingOptions`, `FileRecord`,
//!   `ScanOptions`, `Priority`, `PoolKind`, `BatchStrategy`,
//!   `PerformanceGrade`, `WorkerCount`, `SymlinkPolicy`).
//! - **`entities`** — objects with lifecycle and a terminal state
//!   (`ChunkingResult`, `Batch`, `BatchResult`, `BatchMetrics`, `PoolStats`,
//!   `ScanResult`).
//! - **`services`** — the component contracts (C1–C6): `ChunkHandler` is a
//!   pure sync CPU-bound domain service; `BufferPool`, `WorkerPoolManager`,
//!   `FileChunker`, `FilesystemScanner`, `BatchScheduler`, and `ChunkStore`
//!   are async infrastructure ports, since every one of them fronts I/O.
//! - **`error`** — the single `CoreError` type shared by every component.
//!
//! This crate defines contracts only; concrete adapters (the actual buffer
//! pool, rayon-backed worker pools, walkdir-based scanner, on-disk chunker)
//! live in `backup_core`.

pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

pub use error::{CoreError, CoreResult, ErrorCategory};
