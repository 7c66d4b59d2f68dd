// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker-Pool Manager
//!
//! Admission-controlled pools (§4.2 C2), one per [`PoolKind`] this binary
//! actually dispatches work to: each owns a priority queue (High over Normal
//! over Low, FIFO within a priority), a `tokio::sync::Semaphore` bounding
//! concurrent work, and a background dispatcher task that pops the
//! highest-priority runnable item and executes it via `spawn_blocking`.
//!
//! [`RayonWorkerPoolManager::new`] builds exactly the two pools the scan-once
//! CLI flow drives: [`PoolKind::Io`] (positional reads, File Chunker) and
//! [`PoolKind::Cpu`] (chunk hashing, File Chunker submitting on behalf of the
//! Chunk Handler). `PoolKind` itself names four more pools reserved for
//! capability this flow doesn't need yet (batch-level dispatch, result-
//! assembly callbacks, filesystem watching, pool housekeeping) — `submit`
//! and `pool_stats` accept any [`PoolKind`] but return a closed/default
//! result for one that wasn't constructed, rather than spinning up a
//! dispatcher loop nothing ever feeds.
//!
//! Unlike the teacher's `RESOURCE_MANAGER` static, there is no global
//! instance here: a [`RayonWorkerPoolManager`] is constructed once in the
//! bootstrap composition root and handed down as an `Arc` to everything
//! that submits work.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backup_core_domain::value_objects::{PoolKind, TaskPriority};
use backup_core_domain::services::{PoolTask, PoolThroughputStats, WorkerPoolManager};
use backup_core_domain::CoreError;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify, Semaphore};
use tracing::{debug, warn};

use crate::infrastructure::metrics::MetricsService;

struct QueuedTask {
    task: PoolTask,
    responder: oneshot::Sender<Result<(), CoreError>>,
    enqueued_at: Instant,
}

fn priority_index(priority: TaskPriority) -> usize {
    match priority {
        TaskPriority::Low => 0,
        TaskPriority::Normal => 1,
        TaskPriority::High => 2,
    }
}

struct PoolState {
    kind: PoolKind,
    base_capacity: usize,
    semaphore: Semaphore,
    queues: Mutex<[VecDeque<QueuedTask>; 3]>,
    notify: Notify,
    removed_permits: AtomicU64,
    ops_completed: AtomicU64,
    total_latency_micros: AtomicU64,
    started_at: Instant,
    closed: AtomicBool,
    metrics: Option<Arc<MetricsService>>,
}

impl PoolState {
    fn new(kind: PoolKind, capacity: usize, metrics: Option<Arc<MetricsService>>) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            kind,
            base_capacity: capacity,
            semaphore: Semaphore::new(capacity),
            queues: Mutex::new([VecDeque::new(), VecDeque::new(), VecDeque::new()]),
            notify: Notify::new(),
            removed_permits: AtomicU64::new(0),
            ops_completed: AtomicU64::new(0),
            total_latency_micros: AtomicU64::new(0),
            started_at: Instant::now(),
            closed: AtomicBool::new(false),
            metrics,
        })
    }

    fn enqueue(self: &Arc<Self>, priority: TaskPriority, task: PoolTask, responder: oneshot::Sender<Result<(), CoreError>>) {
        if self.closed.load(Ordering::SeqCst) {
            let _ = responder.send(Err(CoreError::closed(format!("{} pool is shut down", self.kind))));
            return;
        }
        {
            let mut queues = self.queues.lock();
            queues[priority_index(priority)].push_back(QueuedTask {
                task,
                responder,
                enqueued_at: Instant::now(),
            });
        }
        if let Some(metrics) = &self.metrics {
            metrics.set_pool_queue_depth(self.kind, self.queue_len() as i64);
        }
        self.notify.notify_one();
    }

    fn queue_len(&self) -> usize {
        self.queues.lock().iter().map(VecDeque::len).sum()
    }

    fn pop_highest_priority(&self) -> Option<QueuedTask> {
        let mut queues = self.queues.lock();
        for idx in (0..3).rev() {
            if let Some(task) = queues[idx].pop_front() {
                return Some(task);
            }
        }
        None
    }

    fn drain_with_error(&self, error: CoreError) {
        let mut queues = self.queues.lock();
        for queue in queues.iter_mut() {
            while let Some(queued) = queue.pop_front() {
                let _ = queued.responder.send(Err(error.clone()));
            }
        }
    }

    /// Background dispatcher loop: one per pool, spawned at construction time.
    async fn run(self: Arc<Self>) {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                self.drain_with_error(CoreError::closed(format!("{} pool is shut down", self.kind)));
                return;
            }

            let Some(queued) = self.pop_highest_priority() else {
                self.notify.notified().await;
                continue;
            };

            let permit = match self.semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    let _ = queued
                        .responder
                        .send(Err(CoreError::closed(format!("{} pool semaphore closed", self.kind))));
                    continue;
                }
            };

            let wait_micros = queued.enqueued_at.elapsed().as_micros() as u64;
            let state = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                let task = queued.task;
                let result = tokio::task::spawn_blocking(task)
                    .await
                    .unwrap_or_else(|e| Err(CoreError::internal(format!("worker task panicked: {e}"))));

                state.ops_completed.fetch_add(1, Ordering::Relaxed);
                state.total_latency_micros.fetch_add(wait_micros, Ordering::Relaxed);
                if let Some(metrics) = &state.metrics {
                    metrics.record_pool_op(state.kind);
                    metrics.set_pool_queue_depth(state.kind, state.queue_len() as i64);
                }

                let _ = queued.responder.send(result);
            });
        }
    }

    fn stats(&self) -> PoolThroughputStats {
        let elapsed = self.started_at.elapsed().as_secs_f64().max(0.001);
        let ops = self.ops_completed.load(Ordering::Relaxed);
        let avg_latency_ms = if ops > 0 {
            (self.total_latency_micros.load(Ordering::Relaxed) as f64 / ops as f64) / 1000.0
        } else {
            0.0
        };
        let available = self.semaphore.available_permits() as f64;
        let removed = self.removed_permits.load(Ordering::Relaxed) as f64;
        let effective_capacity = (self.base_capacity as f64 - removed).max(1.0);
        let utilization = ((effective_capacity - available).max(0.0) / effective_capacity).min(1.0);
        let efficiency = (effective_capacity / self.base_capacity as f64).clamp(0.0, 1.0);

        PoolThroughputStats {
            ops_per_sec: ops as f64 / elapsed,
            avg_latency_ms,
            utilization,
            efficiency,
        }
    }
}

/// Constructs the pools (§4.2) this binary actually dispatches to, sized
/// from [`CoreConfig`](crate::infrastructure::config::CoreConfig), and spawns
/// a dispatcher task per pool.
pub struct RayonWorkerPoolManager {
    pools: HashMap<PoolKind, Arc<PoolState>>,
}

impl RayonWorkerPoolManager {
    pub fn new(threads_io: usize, threads_cpu: usize, metrics: Option<Arc<MetricsService>>) -> Self {
        let mut pools = HashMap::new();
        let capacities = [(PoolKind::Io, threads_io.max(1)), (PoolKind::Cpu, threads_cpu.max(1))];

        for (kind, capacity) in capacities {
            let state = PoolState::new(kind, capacity, metrics.clone());
            tokio::spawn(Arc::clone(&state).run());
            pools.insert(kind, state);
        }

        Self { pools }
    }

    fn state(&self, kind: PoolKind) -> Option<&Arc<PoolState>> {
        self.pools.get(&kind)
    }
}

#[async_trait]
impl WorkerPoolManager for RayonWorkerPoolManager {
    fn submit(&self, pool: PoolKind, priority: TaskPriority, task: PoolTask) -> BoxFuture<'static, Result<(), CoreError>> {
        let Some(state) = self.state(pool).cloned() else {
            return Box::pin(async move { Err(CoreError::closed(format!("{pool} pool is not active in this build"))) });
        };
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();
            state.enqueue(priority, task, tx);
            rx.await.unwrap_or_else(|_| Err(CoreError::canceled("worker pool dropped the task before completion")))
        })
    }

    async fn apply_backpressure(&self, factor: f64) {
        let factor = factor.clamp(0.0, 1.0);
        for state in self.pools.values() {
            let reduce = ((state.base_capacity as f64) * factor).round() as u32;
            if reduce == 0 {
                continue;
            }
            if let Ok(permit) = state.semaphore.try_acquire_many(reduce) {
                permit.forget();
                state.removed_permits.fetch_add(reduce as u64, Ordering::SeqCst);
                debug!(pool = %state.kind, reduce, "applied backpressure");
            }
        }
    }

    async fn release_backpressure(&self) {
        for state in self.pools.values() {
            let removed = state.removed_permits.swap(0, Ordering::SeqCst);
            if removed > 0 {
                state.semaphore.add_permits(removed as usize);
                debug!(pool = %state.kind, removed, "released backpressure");
            }
        }
    }

    async fn trigger_adaptive_resize(&self) {
        for state in self.pools.values() {
            let queue_len = state.queue_len();
            let available = state.semaphore.available_permits();
            if queue_len > state.base_capacity * 2 && available == 0 {
                state.semaphore.add_permits(1);
                debug!(pool = %state.kind, queue_len, "adaptive resize: grew pool by 1 permit");
            } else if queue_len == 0 && available > state.base_capacity {
                if let Ok(permit) = state.semaphore.try_acquire() {
                    permit.forget();
                }
            }
        }
    }

    async fn stats(&self) -> PoolThroughputStats {
        let per_pool: Vec<PoolThroughputStats> = self.pools.values().map(|s| s.stats()).collect();
        if per_pool.is_empty() {
            return PoolThroughputStats::default();
        }
        let n = per_pool.len() as f64;
        PoolThroughputStats {
            ops_per_sec: per_pool.iter().map(|s| s.ops_per_sec).sum(),
            avg_latency_ms: per_pool.iter().map(|s| s.avg_latency_ms).sum::<f64>() / n,
            utilization: per_pool.iter().map(|s| s.utilization).sum::<f64>() / n,
            efficiency: per_pool.iter().map(|s| s.efficiency).sum::<f64>() / n,
        }
    }

    async fn pool_stats(&self, pool: PoolKind) -> PoolThroughputStats {
        self.state(pool).map(|s| s.stats()).unwrap_or_default()
    }

    async fn shutdown(&self) {
        for state in self.pools.values() {
            state.closed.store(true, Ordering::SeqCst);
            state.notify.notify_waiters();
        }
        // Give dispatcher loops a moment to observe the flag and drain.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_to_an_unconstructed_pool_kind_fails_closed() {
        let manager = RayonWorkerPoolManager::new(2, 2, None);
        let result = manager
            .submit(PoolKind::Batch, TaskPriority::Normal, Box::new(|| Ok(())))
            .await;
        assert!(matches!(result, Err(CoreError::Closed(_))));
    }

    #[tokio::test]
    async fn submit_runs_task_and_returns_result() {
        let manager = RayonWorkerPoolManager::new(2, 2, None);
        let result = manager
            .submit(PoolKind::Cpu, TaskPriority::Normal, Box::new(|| Ok(())))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn submit_propagates_task_error() {
        let manager = RayonWorkerPoolManager::new(1, 1, None);
        let result = manager
            .submit(PoolKind::Io, TaskPriority::Normal, Box::new(|| Err(CoreError::internal("boom"))))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn backpressure_round_trips() {
        let manager = RayonWorkerPoolManager::new(4, 4, None);
        manager.apply_backpressure(0.5).await;
        let stats = manager.pool_stats(PoolKind::Io).await;
        assert!(stats.efficiency < 1.0);
        manager.release_backpressure().await;
        let stats = manager.pool_stats(PoolKind::Io).await;
        assert_eq!(stats.efficiency, 1.0);
    }

    #[tokio::test]
    async fn high_priority_runs_before_low_priority_when_capacity_is_one() {
        let manager = RayonWorkerPoolManager::new(1, 1, None);
        // Occupy the single permit so both submissions queue up.
        let (hold_tx, hold_rx) = oneshot::channel::<()>();
        let occupied = manager.submit(
            PoolKind::Io,
            TaskPriority::Normal,
            Box::new(move || {
                let _ = hold_rx.blocking_recv();
                Ok(())
            }),
        );

        let order = Arc::new(Mutex::new(Vec::new()));
        let order_low = Arc::clone(&order);
        let order_high = Arc::clone(&order);

        let low = manager.submit(
            PoolKind::Io,
            TaskPriority::Low,
            Box::new(move || {
                order_low.lock().push("low");
                Ok(())
            }),
        );
        let high = manager.submit(
            PoolKind::Io,
            TaskPriority::High,
            Box::new(move || {
                order_high.lock().push("high");
                Ok(())
            }),
        );

        // let both queue before releasing the holder
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = hold_tx.send(());

        let _ = occupied.await;
        let _ = futures::join!(low, high);

        assert_eq!(*order.lock(), vec!["high", "low"]);
    }
}
