// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Symlink handling policy for the filesystem scanner (§4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SymlinkPolicy {
    /// Symbolic links are not emitted at all.
    #[default]
    Skip,
    /// Symbolic links are emitted as file records carrying `link_target`, not
    /// followed.
    Record,
    /// Symbolic links are resolved and the target's metadata is used.
    Follow,
}

impl std::str::FromStr for SymlinkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "record" => Ok(Self::Record),
            "follow" => Ok(Self::Follow),
            other => Err(format!("unknown symlink policy: {other}")),
        }
    }
}
