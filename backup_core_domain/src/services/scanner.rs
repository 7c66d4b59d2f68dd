// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Scanner Port (C5)
//!
//! Walks a root directory under filters and produces a stream of file
//! records (§4.5). Progress/visitor hooks are modeled as a capability
//! object per the "listener interfaces become capability objects" design
//! note (§9), rather than a `FileVisitor` trait hierarchy.

use crate::entities::ScanResult;
use crate::value_objects::ScanOptions;
use crate::CoreError;
use async_trait::async_trait;
use std::path::Path;

/// Directive a [`ScanVisitor`] may return to steer the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirective {
    Continue,
    SkipSubtree,
    Terminate,
}

/// Narrow, capability-style hooks into an in-progress scan. All methods have
/// a default no-op body so callers only override what they need; a
/// recording implementation in tests captures calls for assertions (§9).
pub trait ScanVisitor: Send + Sync {
    fn on_scan_started(&self, _root: &Path) {}

    fn on_file_processed(&self, _path: &Path, _processed: u64, _total_estimate: Option<u64>) -> ScanDirective {
        ScanDirective::Continue
    }

    fn on_scan_completed(&self, _result: &ScanResult) {}

    fn on_scan_error(&self, _path: &Path, _err: &CoreError) {}
}

/// A visitor that takes no action and never alters the walk; the default
/// when the caller supplies none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScanVisitor;

impl ScanVisitor for NullScanVisitor {}

#[async_trait]
pub trait FilesystemScanner: Send + Sync {
    /// Walks `root` under `options`, invoking `visitor` as entries are
    /// discovered. Fails with `InvalidArgument` if `root` is missing or not
    /// a directory; per-path errors are captured into `result.errors`
    /// instead of aborting the walk (§4.5 Failure).
    async fn scan(
        &self,
        root: &Path,
        options: &ScanOptions,
        visitor: &(dyn ScanVisitor),
    ) -> Result<ScanResult, CoreError>;

    /// Convenience for callers that don't need progress hooks.
    async fn scan_silent(&self, root: &Path, options: &ScanOptions) -> Result<ScanResult, CoreError> {
        self.scan(root, options, &NullScanVisitor).await
    }
}
