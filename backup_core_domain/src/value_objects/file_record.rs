// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Record
//!
//! Immutable description of one filesystem entry produced by the Filesystem
//! Scanner (§4.5). Once emitted by C5 a `FileRecord` never changes; the
//! Batch Scheduler and File Chunker consume it by reference.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    path: PathBuf,
    size: u64,
    is_symlink: bool,
    link_target: Option<PathBuf>,
    attrs: FileAttrs,
}

/// Platform-observable attributes relevant to scan filtering and reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttrs {
    pub readonly: bool,
    pub hidden: bool,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, size: u64, attrs: FileAttrs) -> Self {
        Self {
            path: path.into(),
            size,
            is_symlink: false,
            link_target: None,
            attrs,
        }
    }

    pub fn with_symlink(mut self, link_target: impl Into<PathBuf>) -> Self {
        self.is_symlink = true;
        self.link_target = Some(link_target.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    pub fn link_target(&self) -> Option<&Path> {
        self.link_target.as_deref()
    }

    pub fn attrs(&self) -> &FileAttrs {
        &self.attrs
    }

    /// The leading-dot-basename hidden test used on POSIX (§4.5 filtering
    /// order step 1); platforms exposing a hidden attribute should prefer
    /// `attrs.hidden` instead.
    pub fn has_dot_basename(&self) -> bool {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
    }
}
