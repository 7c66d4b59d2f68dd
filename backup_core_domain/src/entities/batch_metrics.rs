// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-batch performance metrics emitted alongside a `BatchResult` (§4.6
//! step 5).

use crate::value_objects::PerformanceGrade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub throughput_mb_s: f64,
    pub avg_time_per_file_ms: f64,
    pub avg_time_per_batch_ms: f64,
    pub peak_memory_bytes: u64,
    pub avg_memory_bytes: u64,
    pub cpu_percent: f64,
    pub io_wait_percent: f64,
    pub cache_hit_rate: f64,
    pub efficiency_percent: f64,
    pub utilization_score: f64,
}

impl BatchMetrics {
    pub fn grade(&self) -> PerformanceGrade {
        PerformanceGrade::from_efficiency(self.efficiency_percent / 100.0)
    }
}
