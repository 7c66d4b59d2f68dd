// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Scanner (C5)
//!
//! Walks a root directory with [`walkdir`] and emits [`FileRecord`]s under
//! the fixed filtering order (§4.5): hidden, symlink policy, include glob,
//! exclude glob, size range. Per-path errors (permission denied, a broken
//! symlink under `RECORD`) are folded into `ScanResult.errors`; only a
//! missing or non-directory root aborts the scan itself.
//!
//! The walk is synchronous and the caller-supplied [`ScanVisitor`] is an
//! arbitrary, non-`'static` trait object, so it can't cross into a
//! [`backup_core_domain::services::PoolTask`] (which requires `'static`).
//! Instead of spawning, the walk runs via `tokio::task::block_in_place`:
//! the calling worker thread is marked blockable in place so the runtime can
//! move other tasks elsewhere, without needing the visitor or options to be
//! `Send + 'static`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use backup_core_domain::entities::{ScanEntryError, ScanResult};
use backup_core_domain::services::{FilesystemScanner, ScanDirective, ScanVisitor};
use backup_core_domain::value_objects::{FileAttrs, FileRecord, ScanOptions, SymlinkPolicy};
use backup_core_domain::CoreError;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy)]
pub struct WalkdirScanner;

impl WalkdirScanner {
    pub fn new() -> Self {
        Self
    }

    fn compile_globs(patterns: &[String]) -> Result<Vec<glob::Pattern>, CoreError> {
        patterns
            .iter()
            .map(|p| glob::Pattern::new(p).map_err(|e| CoreError::invalid_argument(format!("invalid glob pattern {p:?}: {e}"))))
            .collect()
    }

    fn is_hidden(entry: &walkdir::DirEntry) -> bool {
        entry.file_name().to_str().is_some_and(|n| n.starts_with('.') && n != "." && n != "..")
    }

    fn matches_any(patterns: &[glob::Pattern], path: &Path) -> bool {
        let text = path.to_string_lossy();
        patterns.iter().any(|p| p.matches(&text))
    }
}

/// The actual walk, run synchronously inside `block_in_place`.
fn walk(root: &Path, options: &ScanOptions, visitor: &dyn ScanVisitor, include: &[glob::Pattern], exclude: &[glob::Pattern]) -> ScanResult {
    let mut result = ScanResult::default();
    visitor.on_scan_started(root);

    let follow = matches!(options.symlink_policy, SymlinkPolicy::Follow);
    let mut iter = WalkDir::new(root).follow_links(follow).into_iter();
    let mut processed: u64 = 0;

    loop {
        let entry = match iter.next() {
            Some(entry) => entry,
            None => break,
        };

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                let core_err = CoreError::io_failure(err.to_string());
                visitor.on_scan_error(&path, &core_err);
                result.errors.push(ScanEntryError { path, message: err.to_string() });
                continue;
            }
        };

        // The root entry itself is never emitted as a file record.
        if entry.depth() == 0 {
            continue;
        }

        if !options.depth_in_range(entry.depth()) {
            if entry.file_type().is_dir() {
                iter.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_dir() {
            continue;
        }

        // Step 1: hidden filter.
        if !options.include_hidden && WalkdirScanner::is_hidden(&entry) {
            continue;
        }

        let is_symlink = entry.path_is_symlink();

        // Step 2: symlink policy.
        if is_symlink && !follow {
            match options.symlink_policy {
                SymlinkPolicy::Skip => continue,
                SymlinkPolicy::Record => {
                    let link_target = match std::fs::read_link(entry.path()) {
                        Ok(target) => target,
                        Err(err) => {
                            let core_err = CoreError::io_failure(format!("broken symlink: {err}"));
                            visitor.on_scan_error(entry.path(), &core_err);
                            result.errors.push(ScanEntryError {
                                path: entry.path().to_path_buf(),
                                message: core_err.to_string(),
                            });
                            continue;
                        }
                    };
                    // Confirm the link actually resolves; an unresolvable
                    // target is the "broken symlink under RECORD" failure
                    // the spec calls out explicitly.
                    if std::fs::metadata(entry.path()).is_err() {
                        let core_err = CoreError::io_failure("symlink target does not resolve");
                        visitor.on_scan_error(entry.path(), &core_err);
                        result.errors.push(ScanEntryError {
                            path: entry.path().to_path_buf(),
                            message: core_err.to_string(),
                        });
                        continue;
                    }

                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    if !options.size_in_range(size) {
                        continue;
                    }
                    let path = entry.path().to_path_buf();
                    let record = FileRecord::new(path.clone(), size, attrs_of(&entry)).with_symlink(link_target);
                    emit(&mut result, &mut processed, visitor, record, path);
                    continue;
                }
                SymlinkPolicy::Follow => unreachable!("follow_links(true) resolves symlinks before they reach this branch"),
            }
        }

        // Step 3/4: include/exclude globs.
        if !include.is_empty() && !WalkdirScanner::matches_any(include, entry.path()) {
            continue;
        }
        if !exclude.is_empty() && WalkdirScanner::matches_any(exclude, entry.path()) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                let core_err = CoreError::io_failure(err.to_string());
                visitor.on_scan_error(entry.path(), &core_err);
                result.errors.push(ScanEntryError {
                    path: entry.path().to_path_buf(),
                    message: core_err.to_string(),
                });
                continue;
            }
        };
        let size = metadata.len();

        // Step 5: size range (files only).
        if !options.size_in_range(size) {
            continue;
        }

        let path = entry.path().to_path_buf();
        let record = FileRecord::new(path.clone(), size, attrs_of(&entry));
        let directive = emit(&mut result, &mut processed, visitor, record, path);
        match directive {
            ScanDirective::Continue => {}
            ScanDirective::SkipSubtree => iter.skip_current_dir(),
            ScanDirective::Terminate => break,
        }
    }

    visitor.on_scan_completed(&result);
    result
}

fn attrs_of(entry: &walkdir::DirEntry) -> FileAttrs {
    let readonly = entry.metadata().map(|m| m.permissions().readonly()).unwrap_or(false);
    FileAttrs {
        readonly,
        hidden: WalkdirScanner::is_hidden(entry),
    }
}

fn emit(result: &mut ScanResult, processed: &mut u64, visitor: &dyn ScanVisitor, record: FileRecord, path: PathBuf) -> ScanDirective {
    *processed += 1;
    debug!(path = %path.display(), size = record.size(), "file record emitted");
    let directive = visitor.on_file_processed(&path, *processed, None);
    result.files.push(record);
    directive
}

#[async_trait]
impl FilesystemScanner for WalkdirScanner {
    async fn scan(&self, root: &Path, options: &ScanOptions, visitor: &(dyn ScanVisitor)) -> Result<ScanResult, CoreError> {
        if !root.exists() {
            return Err(CoreError::invalid_argument(format!("scan root {} does not exist", root.display())));
        }
        if !root.is_dir() {
            return Err(CoreError::invalid_argument(format!("scan root {} is not a directory", root.display())));
        }

        let include = Self::compile_globs(&options.include_glob)?;
        let exclude = Self::compile_globs(&options.exclude_glob)?;

        let result = tokio::task::block_in_place(|| walk(root, options, visitor, &include, &exclude));
        if !result.errors.is_empty() {
            warn!(count = result.errors.len(), "scan completed with per-path errors");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backup_core_domain::services::NullScanVisitor;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    fn scanner() -> WalkdirScanner {
        WalkdirScanner::new()
    }

    #[tokio::test]
    async fn missing_root_is_invalid_argument() {
        let s = scanner();
        let err = s.scan(Path::new("/no/such/path"), &ScanOptions::default(), &NullScanVisitor).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn root_that_is_a_file_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, b"x").unwrap();
        let s = scanner();
        let err = s.scan(&file_path, &ScanOptions::default(), &NullScanVisitor).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn emits_all_visible_files_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
        fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), b"c").unwrap();

        let s = scanner();
        let result = s.scan(dir.path(), &ScanOptions::default(), &NullScanVisitor).await.unwrap();
        assert_eq!(result.files.len(), 3);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn hidden_files_are_excluded_unless_requested() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        fs::write(dir.path().join("visible.txt"), b"x").unwrap();

        let s = scanner();
        let default_result = s.scan(dir.path(), &ScanOptions::default(), &NullScanVisitor).await.unwrap();
        assert_eq!(default_result.files.len(), 1);

        let opts = ScanOptions::builder().include_hidden(true).build();
        let with_hidden = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
        assert_eq!(with_hidden.files.len(), 2);
    }

    #[tokio::test]
    async fn max_depth_zero_only_sees_root_level_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("nested.txt"), b"x").unwrap();

        let opts = ScanOptions::builder().max_depth(0).build();
        let s = scanner();
        let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path().file_name().unwrap(), "top.txt");
    }

    #[tokio::test]
    async fn size_range_filters_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("small.bin"), vec![0u8; 4]).unwrap();
        fs::write(dir.path().join("big.bin"), vec![0u8; 4096]).unwrap();

        let opts = ScanOptions::builder().min_size(1024).build();
        let s = scanner();
        let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path().file_name().unwrap(), "big.bin");
    }

    #[tokio::test]
    async fn include_glob_keeps_only_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.rs"), b"x").unwrap();
        fs::write(dir.path().join("skip.txt"), b"x").unwrap();

        let opts = ScanOptions::builder().include_glob("*.rs").build();
        let s = scanner();
        let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path().extension().unwrap(), "rs");
    }

    #[tokio::test]
    async fn exclude_glob_drops_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.rs"), b"x").unwrap();
        fs::write(dir.path().join("skip.tmp"), b"x").unwrap();

        let opts = ScanOptions::builder().exclude_glob("*.tmp").build();
        let s = scanner();
        let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path().extension().unwrap(), "rs");
    }

    #[tokio::test]
    async fn symlink_skip_policy_omits_links() {
        #[cfg(unix)]
        {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("real.txt"), b"x").unwrap();
            std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();

            let opts = ScanOptions::builder().symlink_policy(SymlinkPolicy::Skip).build();
            let s = scanner();
            let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
            assert_eq!(result.files.len(), 1);
        }
    }

    #[tokio::test]
    async fn symlink_record_policy_captures_link_target() {
        #[cfg(unix)]
        {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("real.txt");
            fs::write(&target, b"x").unwrap();
            let link = dir.path().join("link.txt");
            std::os::unix::fs::symlink(&target, &link).unwrap();

            let opts = ScanOptions::builder().symlink_policy(SymlinkPolicy::Record).build();
            let s = scanner();
            let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
            assert_eq!(result.files.len(), 2);
            let link_record = result.files.iter().find(|f| f.is_symlink()).unwrap();
            assert_eq!(link_record.link_target().unwrap(), target);
        }
    }

    #[tokio::test]
    async fn broken_symlink_under_record_is_a_per_path_error() {
        #[cfg(unix)]
        {
            let dir = tempfile::tempdir().unwrap();
            let link = dir.path().join("dangling.txt");
            std::os::unix::fs::symlink(dir.path().join("does-not-exist"), &link).unwrap();

            let opts = ScanOptions::builder().symlink_policy(SymlinkPolicy::Record).build();
            let s = scanner();
            let result = s.scan(dir.path(), &opts, &NullScanVisitor).await.unwrap();
            assert!(result.files.is_empty());
            assert_eq!(result.errors.len(), 1);
        }
    }

    struct RecordingVisitor {
        processed_paths: StdMutex<Vec<PathBuf>>,
        terminate_after: usize,
        calls: AtomicUsize,
    }

    impl ScanVisitor for RecordingVisitor {
        fn on_file_processed(&self, path: &Path, _processed: u64, _total_estimate: Option<u64>) -> ScanDirective {
            self.processed_paths.lock().unwrap().push(path.to_path_buf());
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.terminate_after {
                ScanDirective::Terminate
            } else {
                ScanDirective::Continue
            }
        }
    }

    #[tokio::test]
    async fn terminate_directive_stops_the_walk_early() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}.txt")), b"x").unwrap();
        }
        let visitor = RecordingVisitor {
            processed_paths: StdMutex::new(Vec::new()),
            terminate_after: 2,
            calls: AtomicUsize::new(0),
        };
        let s = scanner();
        let result = s.scan(dir.path(), &ScanOptions::default(), &visitor).await.unwrap();
        assert_eq!(result.files.len(), 2);
    }
}
