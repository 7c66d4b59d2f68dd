// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker-Pool Manager Port (C2)
//!
//! Owns the five named pools plus the management pool (§4.2). Per the
//! "global singletons become a process-scope handle" design note (§9), this
//! is never a hidden static: a concrete `WorkerPoolManager` is constructed
//! once in the bootstrap composition root and passed down explicitly to
//! every component that needs to submit work.

use crate::value_objects::{PoolKind, TaskPriority};
use crate::CoreError;
use async_trait::async_trait;
use futures::future::BoxFuture;

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolThroughputStats {
    pub ops_per_sec: f64,
    pub avg_latency_ms: f64,
    pub utilization: f64,
    pub efficiency: f64,
}

/// A unit of work submitted to a named pool. Returns its own result as an
/// opaque byte payload; concrete wrappers add typed result handling on top
/// (the trait itself can't be generic over the return type and remain
/// object-safe).
pub type PoolTask = Box<dyn FnOnce() -> Result<(), CoreError> + Send>;

#[async_trait]
pub trait WorkerPoolManager: Send + Sync {
    /// Submits `task` to `pool`; `priority` influences queuing order within
    /// that pool. Returns a future resolving when the task completes.
    fn submit(&self, pool: PoolKind, priority: TaskPriority, task: PoolTask) -> BoxFuture<'static, Result<(), CoreError>>;

    /// A non-zero `factor` in `[0, 1]` reduces effective admission/concurrency
    /// of all pools proportionally; `0.0` restores full capacity.
    async fn apply_backpressure(&self, factor: f64);

    async fn release_backpressure(&self);

    /// Evaluates per-pool throughput/latency and adjusts active worker count
    /// within configured bounds.
    async fn trigger_adaptive_resize(&self);

    async fn stats(&self) -> PoolThroughputStats;

    async fn pool_stats(&self, pool: PoolKind) -> PoolThroughputStats;

    /// Drains in-flight work, then rejects new submissions with `Closed`.
    async fn shutdown(&self);
}
