// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Prometheus-based observability for the scanning-and-chunking engine:
//! worker-pool throughput and queue depth per [`PoolKind`], batch processing
//! duration and bytes, buffer-pool hit/miss counts, and scan/file error
//! totals. Thread-safe, low overhead, registered under the
//! `backup_core` namespace.

use std::sync::Arc;

use backup_core_domain::value_objects::PoolKind;
use backup_core_domain::CoreError;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry};
use tracing::debug;

#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    pool_ops_total: IntCounterVec,
    pool_queue_depth: IntGaugeVec,

    batches_processed_total: IntCounter,
    batch_duration_seconds: Histogram,
    batch_bytes_processed_total: IntCounter,

    buffer_pool_hits_total: IntCounter,
    buffer_pool_misses_total: IntCounter,

    scan_errors_total: IntCounter,
    file_errors_total: IntCounter,
}

impl MetricsService {
    pub fn new() -> Result<Self, CoreError> {
        let registry = Registry::new();

        let pool_ops_total = IntCounterVec::new(
            Opts::new("pool_ops_total", "Total tasks completed per worker pool").namespace("backup_core"),
            &["pool"],
        )
        .map_err(|e| CoreError::internal(format!("failed to create pool_ops_total metric: {e}")))?;

        let pool_queue_depth = IntGaugeVec::new(
            Opts::new("pool_queue_depth", "Current queued task count per worker pool").namespace("backup_core"),
            &["pool"],
        )
        .map_err(|e| CoreError::internal(format!("failed to create pool_queue_depth metric: {e}")))?;

        let batches_processed_total = IntCounter::with_opts(
            Opts::new("batches_processed_total", "Total batches processed").namespace("backup_core"),
        )
        .map_err(|e| CoreError::internal(format!("failed to create batches_processed_total metric: {e}")))?;

        let batch_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("batch_duration_seconds", "Time spent processing a batch")
                .namespace("backup_core")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]),
        )
        .map_err(|e| CoreError::internal(format!("failed to create batch_duration_seconds metric: {e}")))?;

        let batch_bytes_processed_total = IntCounter::with_opts(
            Opts::new("batch_bytes_processed_total", "Total bytes processed across all batches")
                .namespace("backup_core"),
        )
        .map_err(|e| CoreError::internal(format!("failed to create batch_bytes_processed_total metric: {e}")))?;

        let buffer_pool_hits_total = IntCounter::with_opts(
            Opts::new("buffer_pool_hits_total", "Total buffer pool acquisitions served from the free list")
                .namespace("backup_core"),
        )
        .map_err(|e| CoreError::internal(format!("failed to create buffer_pool_hits_total metric: {e}")))?;

        let buffer_pool_misses_total = IntCounter::with_opts(
            Opts::new("buffer_pool_misses_total", "Total buffer pool acquisitions that allocated fresh")
                .namespace("backup_core"),
        )
        .map_err(|e| CoreError::internal(format!("failed to create buffer_pool_misses_total metric: {e}")))?;

        let scan_errors_total = IntCounter::with_opts(
            Opts::new("scan_errors_total", "Total per-entry errors encountered while scanning").namespace("backup_core"),
        )
        .map_err(|e| CoreError::internal(format!("failed to create scan_errors_total metric: {e}")))?;

        let file_errors_total = IntCounter::with_opts(
            Opts::new("file_errors_total", "Total files that failed to chunk").namespace("backup_core"),
        )
        .map_err(|e| CoreError::internal(format!("failed to create file_errors_total metric: {e}")))?;

        registry
            .register(Box::new(pool_ops_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register pool_ops_total: {e}")))?;
        registry
            .register(Box::new(pool_queue_depth.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register pool_queue_depth: {e}")))?;
        registry
            .register(Box::new(batches_processed_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register batches_processed_total: {e}")))?;
        registry
            .register(Box::new(batch_duration_seconds.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register batch_duration_seconds: {e}")))?;
        registry
            .register(Box::new(batch_bytes_processed_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register batch_bytes_processed_total: {e}")))?;
        registry
            .register(Box::new(buffer_pool_hits_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register buffer_pool_hits_total: {e}")))?;
        registry
            .register(Box::new(buffer_pool_misses_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register buffer_pool_misses_total: {e}")))?;
        registry
            .register(Box::new(scan_errors_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register scan_errors_total: {e}")))?;
        registry
            .register(Box::new(file_errors_total.clone()))
            .map_err(|e| CoreError::internal(format!("failed to register file_errors_total: {e}")))?;

        debug!("MetricsService initialized with Prometheus registry");

        Ok(Self {
            registry: Arc::new(registry),
            pool_ops_total,
            pool_queue_depth,
            batches_processed_total,
            batch_duration_seconds,
            batch_bytes_processed_total,
            buffer_pool_hits_total,
            buffer_pool_misses_total,
            scan_errors_total,
            file_errors_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_pool_op(&self, pool: PoolKind) {
        self.pool_ops_total.with_label_values(&[pool.as_str()]).inc();
    }

    pub fn set_pool_queue_depth(&self, pool: PoolKind, depth: i64) {
        self.pool_queue_depth.with_label_values(&[pool.as_str()]).set(depth);
    }

    pub fn record_batch_completion(&self, duration: std::time::Duration, bytes_processed: u64) {
        self.batches_processed_total.inc();
        self.batch_duration_seconds.observe(duration.as_secs_f64());
        self.batch_bytes_processed_total.inc_by(bytes_processed);
    }

    pub fn record_buffer_pool_hit(&self) {
        self.buffer_pool_hits_total.inc();
    }

    pub fn record_buffer_pool_miss(&self) {
        self.buffer_pool_misses_total.inc();
    }

    pub fn record_scan_error(&self) {
        self.scan_errors_total.inc();
    }

    pub fn record_file_error(&self) {
        self.file_errors_total.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registers_without_error() {
        let service = MetricsService::new().unwrap();
        assert!(!service.registry().gather().is_empty());
    }

    #[test]
    fn pool_op_increments_labeled_counter() {
        let service = MetricsService::new().unwrap();
        service.record_pool_op(PoolKind::Io);
        service.record_pool_op(PoolKind::Io);
        service.record_pool_op(PoolKind::Cpu);

        let families = service.registry().gather();
        let pool_ops = families.iter().find(|f| f.name() == "backup_core_pool_ops_total").unwrap();
        let io_metric = pool_ops
            .get_metric()
            .iter()
            .find(|m| m.get_label().iter().any(|l| l.value() == "io"))
            .unwrap();
        assert_eq!(io_metric.get_counter().value(), 2.0);
    }

    #[test]
    fn buffer_pool_hit_and_miss_are_independent() {
        let service = MetricsService::new().unwrap();
        service.record_buffer_pool_hit();
        service.record_buffer_pool_hit();
        service.record_buffer_pool_miss();
        assert_eq!(service.buffer_pool_hits_total.get(), 2);
        assert_eq!(service.buffer_pool_misses_total.get(), 1);
    }
}
