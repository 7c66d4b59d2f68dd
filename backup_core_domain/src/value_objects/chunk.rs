// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Value Object
//!
//! A single fixed-length (except possibly the last) byte range of a file,
//! paired with its digest once hashed. `Chunk` carries only metadata; the
//! byte payload lives in a pooled buffer (see `services::buffer_pool`) for
//! the duration of the read-and-hash span and is not retained here.

use crate::value_objects::Digest;
use serde::{Deserialize, Serialize};

/// Metadata for one chunk: its position in the file and its digest.
///
/// Invariant: within a `ChunkingResult`, chunks are ordered by `index` and
/// `chunk_digests[i].offset == i * chunk_size` for every `i` but the last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    index: u64,
    offset: u64,
    length: u64,
    digest: Digest,
}

impl Chunk {
    pub fn new(index: u64, offset: u64, length: u64, digest: Digest) -> Self {
        Self {
            index,
            offset,
            length,
            digest,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// The half-open byte range `[offset, offset + length)` this chunk covers.
    pub fn byte_range(&self) -> std::ops::Range<u64> {
        self.offset..(self.offset + self.length)
    }
}
