// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Adapters
//!
//! Concrete implementations of the domain's component contracts: worker
//! pools (C2), buffer pool (C1), chunk handler (C3), file chunker (C4),
//! batch scheduler (C6), and the default chunk store.

pub mod batch_scheduler;
pub mod buffer_pool;
pub mod chunk_handler;
pub mod chunk_store;
pub mod file_chunker;
pub mod hash_function;
pub mod worker_pool;
