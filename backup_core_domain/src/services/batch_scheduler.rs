// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch Scheduler / Processor Port (C6)
//!
//! Turns a stream of files into ordered, concurrent batches; preserves
//! priority; enforces concurrency caps; exposes metrics (§4.6).

use crate::entities::BatchResult;
use crate::value_objects::{BatchStrategy, ChunkingOptions, FileRecord, Priority};
use crate::CoreError;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct BatchSchedulerConfig {
    pub max_concurrent_batches: usize,
    pub adaptive_sizing: bool,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub strategy: BatchStrategy,
}

impl Default for BatchSchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: 4,
            adaptive_sizing: true,
            min_batch_size: 1,
            max_batch_size: 256,
            strategy: BatchStrategy::default(),
        }
    }
}

#[async_trait]
pub trait BatchScheduler: Send + Sync {
    /// Processes `files` as one batch and awaits its completion.
    /// `InvalidArgument` for empty `files` (§4.6).
    async fn process_batch(
        &self,
        files: Vec<FileRecord>,
        options: ChunkingOptions,
        priority: Priority,
    ) -> Result<BatchResult, CoreError> {
        self.process_batch_with_deps(files, options, priority, Vec::new()).await
    }

    /// As [`Self::process_batch`], but the batch is held until every id in
    /// `deps` has reached a terminal state; if any dependency failed, this
    /// batch fails immediately with `DependencyFailed` (§3, §4.6 Dependencies).
    async fn process_batch_with_deps(
        &self,
        files: Vec<FileRecord>,
        options: ChunkingOptions,
        priority: Priority,
        deps: Vec<Uuid>,
    ) -> Result<BatchResult, CoreError>;

    /// Enqueues `files` for asynchronous processing and returns the assigned
    /// batch id immediately; the result can be retrieved once the batch
    /// reaches a terminal state.
    async fn schedule_batch(
        &self,
        files: Vec<FileRecord>,
        options: ChunkingOptions,
        priority: Priority,
    ) -> Result<Uuid, CoreError> {
        self.schedule_batch_with_deps(files, options, priority, Vec::new()).await
    }

    /// As [`Self::schedule_batch`], but the batch is held until every id in
    /// `deps` has reached a terminal state.
    async fn schedule_batch_with_deps(
        &self,
        files: Vec<FileRecord>,
        options: ChunkingOptions,
        priority: Priority,
        deps: Vec<Uuid>,
    ) -> Result<Uuid, CoreError>;

    async fn apply_backpressure(&self, factor: f64);

    async fn release_backpressure(&self);

    async fn update_configuration(&self, config: BatchSchedulerConfig);

    /// Drains in-flight batches, then rejects new ones with `Closed`.
    async fn close(&self);
}
