// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hash Function Port
//!
//! The cryptographic hash primitive is explicitly out of scope for this
//! crate (§1); this module only defines the contract a concrete
//! implementation must satisfy (§6 "Hash function"). It is a pure, sync,
//! CPU-bound domain service, consistent with the `ChecksumService`/
//! `ChunkProcessor` split the teacher applies to sync business logic versus
//! the async `FileIOService` port.

use crate::CoreError;

/// A deterministic, side-effect-free digest function producing a
/// fixed-width byte string from a byte range.
pub trait HashFunction: Send + Sync {
    /// Hashes `bytes` in one call.
    fn digest(&self, bytes: &[u8]) -> Vec<u8>;

    /// Width in bytes of the digest this function produces.
    fn output_len(&self) -> usize;

    /// Starts an incremental hash session for streaming input.
    fn incremental(&self) -> Box<dyn IncrementalHash>;
}

/// An in-progress incremental hash computation.
pub trait IncrementalHash: Send {
    fn update(&mut self, bytes: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
    /// Resets the session to its initial state, matching the source
    /// contract's `reset()` (§6); not required by the current File Chunker
    /// (each file gets a fresh session) but kept for API parity.
    fn reset(&mut self);
}

/// Returns the digest of the empty byte sequence for `hash`, used by the
/// File Chunker's zero-length-file case (§4.4 step 1).
pub fn digest_of_empty(hash: &dyn HashFunction) -> Vec<u8> {
    hash.digest(&[])
}

#[derive(Debug, thiserror::Error)]
#[error("hash function error: {0}")]
pub struct HashError(pub String);

impl From<HashError> for CoreError {
    fn from(err: HashError) -> Self {
        CoreError::io_failure(err.0)
    }
}
