// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SHA-256 Hash Function
//!
//! Default implementation of the [`HashFunction`] port (§6 "Hash function").
//! The core treats this as one pluggable implementation among others; chunk
//! handler and file chunker only ever see the trait.

use backup_core_domain::services::{HashFunction, IncrementalHash};
use sha2::{Digest as _, Sha256};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256HashFunction;

impl HashFunction for Sha256HashFunction {
    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        Sha256::digest(bytes).to_vec()
    }

    fn output_len(&self) -> usize {
        32
    }

    fn incremental(&self) -> Box<dyn IncrementalHash> {
        Box::new(Sha256Incremental(Sha256::new()))
    }
}

struct Sha256Incremental(Sha256);

impl IncrementalHash for Sha256Incremental {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }

    fn reset(&mut self) {
        self.0 = Sha256::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_sha256() {
        let hash = Sha256HashFunction;
        let digest = hash.digest(&[]);
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn incremental_matches_one_shot() {
        let hash = Sha256HashFunction;
        let data = b"the quick brown fox jumps over the lazy dog";

        let one_shot = hash.digest(data);

        let mut incremental = hash.incremental();
        incremental.update(&data[..10]);
        incremental.update(&data[10..]);
        let streamed = incremental.finalize();

        assert_eq!(one_shot, streamed);
    }

    #[test]
    fn reset_clears_prior_state() {
        let hash = Sha256HashFunction;
        let mut incremental = hash.incremental();
        incremental.update(b"garbage");
        incremental.reset();
        incremental.update(b"");
        assert_eq!(incremental.finalize(), hash.digest(&[]));
    }
}
