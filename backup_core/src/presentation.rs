// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Presentation Layer
//!
//! Everything that sits between the validated CLI arguments produced by
//! `backup_core_bootstrap` and the component ports in
//! `backup_core_domain::services`: the `scan` command orchestration (scanner
//! → batch scheduler → file chunker → manifest), and the error-summary
//! reporting described in spec §7 ("the CLI prints a summary ... and writes
//! a per-path error list to a side channel").

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backup_core_domain::entities::{BatchResult, ChunkingResult, ScanResult};
use backup_core_domain::services::{BatchScheduler, FilesystemScanner, NullScanVisitor};
use backup_core_domain::value_objects::{ChunkingOptions, FileRecord, Priority, ScanOptions};
use backup_core_domain::{CoreError, ErrorCategory};
use serde::Serialize;
use tracing::{info, warn};

use crate::infrastructure::manifest::{ManifestRecord, ManifestWriter};

/// Drives one end-to-end scan: walks `root`, batches the resulting files
/// through the batch scheduler, and feeds every successfully chunked file to
/// a [`ManifestWriter`].
pub struct ScanCommand {
    scanner: Arc<dyn FilesystemScanner>,
    scheduler: Arc<dyn BatchScheduler>,
}

impl ScanCommand {
    pub fn new(scanner: Arc<dyn FilesystemScanner>, scheduler: Arc<dyn BatchScheduler>) -> Self {
        Self { scanner, scheduler }
    }

    /// Runs the scan and returns the aggregate [`ScanReport`], or `Err` if
    /// the scan itself couldn't start (invalid root, scheduler closed, etc).
    /// Per-file and per-batch failures never surface here; they're folded
    /// into the returned report (§7 propagation policy).
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        root: &Path,
        scan_options: &ScanOptions,
        chunking_options: ChunkingOptions,
        priority: Priority,
        batch_size: usize,
        manifest: &mut dyn ManifestWriter,
    ) -> Result<ScanReport, CoreError> {
        info!(root = %root.display(), "starting scan");
        let scan_result = self.scanner.scan(root, scan_options, &NullScanVisitor).await?;
        info!(
            files = scan_result.files.len(),
            scan_errors = scan_result.errors.len(),
            "scan completed, dispatching batches"
        );

        let mut report = ScanReport::default();
        report.record_scan_errors(&scan_result);

        for chunk in scan_result.files.chunks(batch_size.max(1)) {
            let files: Vec<FileRecord> = chunk.to_vec();
            match self
                .scheduler
                .process_batch(files, chunking_options.clone(), priority)
                .await
            {
                Ok(batch_result) => report.record_batch(&batch_result, manifest).await?,
                Err(err) => {
                    warn!(error = %err, "batch failed to run");
                    report.batch_failures.push(err);
                }
            }
        }

        Ok(report)
    }
}

/// One per-path entry for the side-channel error list (§7).
#[derive(Debug, Clone, Serialize)]
pub struct ReportedError {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

/// Aggregate outcome of a `scan` command invocation: counts by error
/// category plus the manifest records written, suitable both for the
/// human-readable stdout summary and the side-channel error list.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub bytes_processed: u64,
    pub errors: Vec<ReportedError>,
    pub batch_failures: Vec<CoreError>,
}

impl ScanReport {
    fn record_scan_errors(&mut self, scan_result: &ScanResult) {
        for entry in &scan_result.errors {
            self.errors.push(ReportedError {
                path: entry.path.clone(),
                kind: "scan_error",
                message: entry.message.clone(),
            });
        }
    }

    async fn record_batch(&mut self, batch_result: &BatchResult, manifest: &mut dyn ManifestWriter) -> Result<(), CoreError> {
        if let Some(err) = batch_result.error() {
            self.batch_failures.push(err.clone());
        }

        for result in batch_result.results() {
            match result {
                ChunkingResult::Success {
                    path,
                    total_size,
                    file_digest,
                    chunk_digests,
                    ..
                } => {
                    self.files_succeeded += 1;
                    self.bytes_processed += total_size;
                    manifest
                        .write_record(&ManifestRecord {
                            path: path.clone(),
                            size: *total_size,
                            file_digest: file_digest.clone(),
                            chunk_size: chunk_digests.first().map(|c| c.length()).unwrap_or(0),
                            chunks: chunk_digests.clone(),
                        })
                        .await?;
                }
                ChunkingResult::Failure { path, error } => {
                    self.files_failed += 1;
                    self.errors.push(ReportedError {
                        path: path.clone(),
                        kind: category_label(error.category()),
                        message: error.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Counts by error kind, for the human-readable summary line.
    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for err in &self.errors {
            *counts.entry(err.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0 || !self.batch_failures.is_empty()
    }

    /// One-line human-readable summary, e.g. `"scanned 42 files (2 failed):
    /// io_failure=1, not_found=1"`.
    pub fn summary_line(&self) -> String {
        let total = self.files_succeeded + self.files_failed;
        if self.files_failed == 0 {
            return format!("scanned {total} files, all succeeded ({} bytes)", self.bytes_processed);
        }
        let breakdown: Vec<String> = self
            .counts_by_kind()
            .into_iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        format!(
            "scanned {total} files ({} failed): {}",
            self.files_failed,
            breakdown.join(", ")
        )
    }
}

fn category_label(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::InvalidInput => "invalid_input",
        ErrorCategory::NotFound => "not_found",
        ErrorCategory::Permission => "permission_denied",
        ErrorCategory::Resource => "resource_exhausted",
        ErrorCategory::Io => "io_failure",
        ErrorCategory::Cancellation => "canceled",
        ErrorCategory::Timeout => "timed_out",
        ErrorCategory::Lifecycle => "closed",
        ErrorCategory::Dependency => "dependency_failed",
        ErrorCategory::Internal => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backup_core_domain::entities::{BatchMetrics, ScanEntryError};
    use backup_core_domain::value_objects::{Chunk, Digest, FileAttrs};
    use uuid::Uuid;

    fn success(path: &str) -> ChunkingResult {
        ChunkingResult::success(
            path,
            64,
            Digest::new(vec![9]),
            vec![Chunk::new(0, 0, 64, Digest::new(vec![9]))],
        )
    }

    fn failure(path: &str) -> ChunkingResult {
        ChunkingResult::Failure {
            path: PathBuf::from(path),
            error: CoreError::io_failure("disk error"),
        }
    }

    fn batch_result(results: Vec<ChunkingResult>) -> BatchResult {
        BatchResult::new(Uuid::new_v4(), results, 0, 0, 0, BatchMetrics::default())
    }

    struct RecordingManifest(Vec<ManifestRecord>);

    #[async_trait::async_trait]
    impl ManifestWriter for RecordingManifest {
        async fn write_record(&mut self, record: &ManifestRecord) -> Result<(), CoreError> {
            self.0.push(record.clone());
            Ok(())
        }

        async fn finalize(self: Box<Self>) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_files_are_written_to_the_manifest() {
        let mut report = ScanReport::default();
        let mut manifest = RecordingManifest(Vec::new());
        report
            .record_batch(&batch_result(vec![success("a.bin")]), &mut manifest)
            .await
            .unwrap();
        assert_eq!(report.files_succeeded, 1);
        assert_eq!(manifest.0.len(), 1);
        assert_eq!(manifest.0[0].path, PathBuf::from("a.bin"));
    }

    #[tokio::test]
    async fn failed_files_are_counted_but_not_written() {
        let mut report = ScanReport::default();
        let mut manifest = RecordingManifest(Vec::new());
        report
            .record_batch(&batch_result(vec![failure("b.bin")]), &mut manifest)
            .await
            .unwrap();
        assert_eq!(report.files_failed, 1);
        assert!(manifest.0.is_empty());
        assert_eq!(report.counts_by_kind().get("io_failure"), Some(&1));
    }

    #[test]
    fn scan_errors_are_folded_into_the_report() {
        let mut report = ScanReport::default();
        let scan_result = ScanResult {
            files: vec![FileRecord::new("x.bin", 1, FileAttrs::default())],
            errors: vec![ScanEntryError {
                path: PathBuf::from("broken"),
                message: "permission denied".to_string(),
            }],
        };
        report.record_scan_errors(&scan_result);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, "scan_error");
    }

    #[test]
    fn summary_line_reports_success_with_no_failures() {
        let report = ScanReport {
            files_succeeded: 3,
            bytes_processed: 192,
            ..Default::default()
        };
        assert!(report.summary_line().contains("all succeeded"));
        assert!(!report.has_failures());
    }

    #[test]
    fn summary_line_breaks_down_failures_by_kind() {
        let mut report = ScanReport {
            files_succeeded: 1,
            files_failed: 1,
            ..Default::default()
        };
        report.errors.push(ReportedError {
            path: PathBuf::from("b.bin"),
            kind: "io_failure",
            message: "disk error".to_string(),
        });
        assert!(report.summary_line().contains("io_failure=1"));
        assert!(report.has_failures());
    }
}
