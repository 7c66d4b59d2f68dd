// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch Strategy
//!
//! Selectable grouping/concurrency policies for the Batch Scheduler (§4.6).
//! Per the "inheritance trees become tagged variants" design note (§9), each
//! strategy is a plain variant dispatched over in the scheduler rather than a
//! trait object hierarchy; strategy-specific numbers live alongside the
//! variant instead of in separate subclasses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BatchStrategy {
    /// Group files to target roughly equal total bytes per batch.
    #[default]
    SizeBased,
    /// Group files sharing a filesystem location (directory/device) together.
    LocationBased,
    /// Batches are formed strictly along priority boundaries.
    PriorityBased,
    /// Batch size and concurrency adapt to observed CPU/IO pressure.
    ResourceAware,
    /// A blend of size- and resource-aware grouping; the general-purpose
    /// default for mixed workloads.
    Balanced,
    /// Raises per-batch concurrency, tuned for high-queue-depth NVMe storage.
    NvmeOptimized,
    /// Serializes per-device reads to avoid seek thrashing on rotational
    /// disks.
    HddOptimized,
}

impl BatchStrategy {
    /// Whether this strategy wants reads against the same device serialized
    /// rather than parallelized.
    pub fn serializes_per_device(&self) -> bool {
        matches!(self, Self::HddOptimized)
    }

    /// Multiplier applied to the base per-batch concurrency before clamping
    /// to the admission semaphore's configured size.
    pub fn concurrency_multiplier(&self) -> f64 {
        match self {
            Self::NvmeOptimized => 2.0,
            Self::HddOptimized => 0.5,
            _ => 1.0,
        }
    }
}

impl std::str::FromStr for BatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "SIZE_BASED" => Ok(Self::SizeBased),
            "LOCATION_BASED" => Ok(Self::LocationBased),
            "PRIORITY_BASED" => Ok(Self::PriorityBased),
            "RESOURCE_AWARE" => Ok(Self::ResourceAware),
            "BALANCED" => Ok(Self::Balanced),
            "NVME_OPTIMIZED" => Ok(Self::NvmeOptimized),
            "HDD_OPTIMIZED" => Ok(Self::HddOptimized),
            other => Err(format!("unknown batch strategy: {other}")),
        }
    }
}
