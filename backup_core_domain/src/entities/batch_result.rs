// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch Result
//!
//! Terminal outcome of processing one [`crate::entities::Batch`] (§3 Data
//! Model, §4.6). Invariant: `successful + failed == files.len()`; a batch is
//! "successful" iff it completed at all — per-file failures never fail the
//! batch itself (§7 propagation policy).

use crate::entities::{BatchMetrics, ChunkingResult};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    id: Uuid,
    results: Vec<ChunkingResult>,
    start_unix_ms: u64,
    end_unix_ms: u64,
    bytes_processed: u64,
    metrics: BatchMetrics,
    error: Option<CoreError>,
}

impl BatchResult {
    pub fn new(
        id: Uuid,
        results: Vec<ChunkingResult>,
        start_unix_ms: u64,
        end_unix_ms: u64,
        bytes_processed: u64,
        metrics: BatchMetrics,
    ) -> Self {
        Self {
            id,
            results,
            start_unix_ms,
            end_unix_ms,
            bytes_processed,
            metrics,
            error: None,
        }
    }

    pub fn with_error(mut self, error: CoreError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn results(&self) -> &[ChunkingResult] {
        &self.results
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// A batch is successful iff it completed; per-file failures do not
    /// affect this (§3 invariant).
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_unix_ms.saturating_sub(self.start_unix_ms)
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn metrics(&self) -> &BatchMetrics {
        &self.metrics
    }

    pub fn error(&self) -> Option<&CoreError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Digest;

    #[test]
    fn successful_plus_failed_equals_file_count() {
        let results = vec![
            ChunkingResult::success("a", 10, Digest::new(vec![1]), vec![]),
            ChunkingResult::failure("b", CoreError::io_failure("x")),
        ];
        let batch = BatchResult::new(Uuid::new_v4(), results, 0, 5, 10, BatchMetrics::default());
        assert_eq!(batch.successful() + batch.failed(), 2);
        assert!(batch.success());
    }

    #[test]
    fn one_file_fails_but_batch_still_succeeds() {
        let results = vec![ChunkingResult::failure("b", CoreError::io_failure("x"))];
        let batch = BatchResult::new(Uuid::new_v4(), results, 0, 1, 0, BatchMetrics::default());
        assert_eq!(batch.successful(), 0);
        assert_eq!(batch.failed(), 1);
        assert!(batch.success());
    }
}
