// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Digest Value Object
//!
//! An opaque, fixed-width fingerprint produced by the pluggable hash function
//! (§6 "Hash function" in the external-interfaces contract). The core never
//! inspects the bytes of a digest; it only compares, stores, and renders them.
//! Hexadecimal lowercase is the serialization boundary, matching the wire form
//! the manifest uses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque fixed-width byte string identifying content.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let d = Digest::new(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(d.to_hex(), "deadbeef");
        assert_eq!(Digest::from_hex("deadbeef").unwrap(), d);
    }

    #[test]
    fn display_matches_debug_hex() {
        let d = Digest::new(vec![0x01, 0x02]);
        assert_eq!(format!("{d}"), "0102");
        assert_eq!(format!("{d:?}"), "Digest(0102)");
    }
}
