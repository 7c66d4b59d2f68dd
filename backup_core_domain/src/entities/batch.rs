// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch
//!
//! A unit of scheduling grouping one or more files for the Batch Scheduler
//! (§3 Data Model, §4.6). Owned by the scheduler until it reaches a terminal
//! state.

use crate::value_objects::{ChunkingOptions, FileRecord, Priority};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    id: Uuid,
    files: Vec<FileRecord>,
    priority: Priority,
    options: ChunkingOptions,
    /// IDs of batches that must reach a terminal state before this one may
    /// start (§3: "a batch does not start until every dependency has reached
    /// a terminal state").
    deps: Vec<Uuid>,
}

impl Batch {
    pub fn new(files: Vec<FileRecord>, priority: Priority, options: ChunkingOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            files,
            priority,
            options,
            deps: Vec::new(),
        }
    }

    pub fn with_deps(mut self, deps: Vec<Uuid>) -> Self {
        self.deps = deps;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    pub fn deps(&self) -> &[Uuid] {
        &self.deps
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size()).sum()
    }
}
