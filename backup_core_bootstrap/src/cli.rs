// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command Line Interface
//!
//! Parses and validates arguments for the `scan` command in two passes:
//! [`parse_cli`] builds the raw [`Cli`] struct with `clap`, then
//! [`validate`] re-checks everything clap's type system can't express on its
//! own (glob strings free of control characters, numeric ranges, the scan
//! root's existence) before handing back a [`ValidatedCli`] the rest of the
//! program can trust without re-checking.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use backup_core_domain::value_objects::{BatchStrategy, ChunkSize, Priority, ScanOptions, ScanOptionsBuilder, SymlinkPolicy};
use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
    #[error("scan root not found or not a directory: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("argument contains a disallowed pattern: {0}")]
    UnsafeArgument(String),
}

impl ParseError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::RootNotFound(_) => ExitCode::RootNotFound,
            Self::InvalidValue { .. } | Self::UnsafeArgument(_) => ExitCode::InvalidArguments,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "backup-core",
    version,
    about = "Scans a directory tree and content-defined-chunks every file it finds"
)]
pub struct Cli {
    /// Emit verbose (debug-level) logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Path to an optional TOML configuration file overriding built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk a directory tree and chunk every matching file.
    Scan {
        /// Root directory to scan.
        root: PathBuf,

        /// Glob pattern a file must match to be included (repeatable).
        #[arg(long = "include")]
        include: Vec<String>,

        /// Glob pattern that excludes a file even if it matched --include (repeatable).
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Maximum directory depth below the root to descend into.
        #[arg(long = "max-depth")]
        max_depth: Option<usize>,

        /// Skip files smaller than this many bytes.
        #[arg(long = "min-size")]
        min_size: Option<u64>,

        /// Skip files larger than this many bytes.
        #[arg(long = "max-size")]
        max_size: Option<u64>,

        /// Include dotfiles and dot-directories.
        #[arg(long = "include-hidden")]
        include_hidden: bool,

        /// How to handle symlinks: skip, record, or follow.
        #[arg(long = "symlinks", default_value = "skip")]
        symlinks: String,

        /// Chunk size in bytes (default 64 KiB).
        #[arg(long = "chunk-size")]
        chunk_size: Option<usize>,

        /// Force chunked I/O mode: "on" or "off". Unset lets file size decide.
        #[arg(long = "async-io")]
        async_io: Option<String>,

        /// Maximum number of files batched together per scheduling unit.
        #[arg(long = "batch-size")]
        batch_size: Option<usize>,

        /// Maximum number of batches the scheduler runs concurrently.
        #[arg(long = "max-concurrent-batches")]
        max_concurrent_batches: Option<usize>,

        /// Scheduling priority for this scan's batches.
        #[arg(long = "priority", default_value = "normal")]
        priority: String,

        /// Batching strategy hint, e.g. "nvme-optimized" or "hdd-optimized".
        #[arg(long = "batch-strategy", default_value = "size-based")]
        batch_strategy: String,
    },
}

/// All CLI arguments after validation: paths canonicalized, values range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Scan {
        root: PathBuf,
        scan_options: ScanOptions,
        chunk_size: Option<ChunkSize>,
        use_async_io: Option<bool>,
        batch_size: Option<usize>,
        max_concurrent_batches: Option<usize>,
        priority: Priority,
        batch_strategy: BatchStrategy,
    },
}

/// Rejects control characters; globs legitimately use `*`, `?`, `[...]`, so
/// those are not restricted here.
fn validate_argument(arg: &str, value: &str) -> Result<(), ParseError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(ParseError::UnsafeArgument(format!("--{arg} contains a control character")));
    }
    Ok(())
}

/// Canonicalizes `root` and confirms it is a directory, turning the two
/// distinct failure modes (missing path vs. not-a-directory) into a single
/// [`ParseError::RootNotFound`] since callers treat both identically.
fn validate_root(root: &Path) -> Result<PathBuf, ParseError> {
    let canonical = std::fs::canonicalize(root).map_err(|_| ParseError::RootNotFound(root.to_path_buf()))?;
    if !canonical.is_dir() {
        return Err(ParseError::RootNotFound(root.to_path_buf()));
    }
    Ok(canonical)
}

fn parse_bool_flag(arg: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(ParseError::InvalidValue {
            arg: arg.to_string(),
            reason: format!("expected on/off, got '{other}'"),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_scan(
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    max_depth: Option<usize>,
    min_size: Option<u64>,
    max_size: Option<u64>,
    include_hidden: bool,
    symlinks: String,
    chunk_size: Option<usize>,
    async_io: Option<String>,
    batch_size: Option<usize>,
    max_concurrent_batches: Option<usize>,
    priority: String,
    batch_strategy: String,
) -> Result<ValidatedCommand, ParseError> {
    let root = validate_root(&root)?;

    for pattern in include.iter().chain(exclude.iter()) {
        validate_argument("include/exclude", pattern)?;
    }

    let symlink_policy = SymlinkPolicy::from_str(&symlinks).map_err(|_| ParseError::InvalidValue {
        arg: "symlinks".to_string(),
        reason: format!("expected skip/record/follow, got '{symlinks}'"),
    })?;

    let mut scan_builder = ScanOptionsBuilder::default()
        .include_hidden(include_hidden)
        .symlink_policy(symlink_policy);
    if let Some(depth) = max_depth {
        scan_builder = scan_builder.max_depth(depth);
    }
    if let Some(min) = min_size {
        scan_builder = scan_builder.min_size(min);
    }
    if let Some(max) = max_size {
        scan_builder = scan_builder.max_size(max);
    }
    for pattern in include {
        scan_builder = scan_builder.include_glob(pattern);
    }
    for pattern in exclude {
        scan_builder = scan_builder.exclude_glob(pattern);
    }

    let chunk_size = chunk_size
        .map(ChunkSize::new)
        .transpose()
        .map_err(|_| ParseError::InvalidValue {
            arg: "chunk-size".to_string(),
            reason: "chunk size must be nonzero and within the supported maximum".to_string(),
        })?;

    let use_async_io = async_io.map(|v| parse_bool_flag("async-io", &v)).transpose()?;

    if let Some(0) = batch_size {
        return Err(ParseError::InvalidValue {
            arg: "batch-size".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if let Some(0) = max_concurrent_batches {
        return Err(ParseError::InvalidValue {
            arg: "max-concurrent-batches".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let priority = Priority::from_str(&priority).map_err(|_| ParseError::InvalidValue {
        arg: "priority".to_string(),
        reason: format!("expected background/low/normal/high/critical, got '{priority}'"),
    })?;

    let batch_strategy = BatchStrategy::from_str(&batch_strategy).map_err(|_| ParseError::InvalidValue {
        arg: "batch-strategy".to_string(),
        reason: format!("unrecognized batch strategy '{batch_strategy}'"),
    })?;

    Ok(ValidatedCommand::Scan {
        root,
        scan_options: scan_builder.build(),
        chunk_size,
        use_async_io,
        batch_size,
        max_concurrent_batches,
        priority,
        batch_strategy,
    })
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

fn validate(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let command = match cli.command {
        Commands::Scan {
            root,
            include,
            exclude,
            max_depth,
            min_size,
            max_size,
            include_hidden,
            symlinks,
            chunk_size,
            async_io,
            batch_size,
            max_concurrent_batches,
            priority,
            batch_strategy,
        } => validate_scan(
            root,
            include,
            exclude,
            max_depth,
            min_size,
            max_size,
            include_hidden,
            symlinks,
            chunk_size,
            async_io,
            batch_size,
            max_concurrent_batches,
            priority,
            batch_strategy,
        )?,
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config: cli.config,
    })
}

/// Parses `std::env::args()` and validates the result, returning either a
/// trustworthy [`ValidatedCli`] or a [`ParseError`] carrying its own exit code.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate(parse_cli())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_cli(root: PathBuf) -> Cli {
        Cli {
            verbose: false,
            config: None,
            command: Commands::Scan {
                root,
                include: vec![],
                exclude: vec![],
                max_depth: None,
                min_size: None,
                max_size: None,
                include_hidden: false,
                symlinks: "skip".to_string(),
                chunk_size: None,
                async_io: None,
                batch_size: None,
                max_concurrent_batches: None,
                priority: "normal".to_string(),
                batch_strategy: "size-based".to_string(),
            },
        }
    }

    #[test]
    fn missing_root_is_root_not_found() {
        let cli = scan_cli(PathBuf::from("/definitely/does/not/exist/anywhere"));
        let err = validate(cli).unwrap_err();
        assert!(matches!(err, ParseError::RootNotFound(_)));
        assert_eq!(err.exit_code(), ExitCode::RootNotFound);
    }

    #[test]
    fn valid_root_validates_successfully() {
        let dir = tempfile::tempdir().unwrap();
        let cli = scan_cli(dir.path().to_path_buf());
        let validated = validate(cli).unwrap();
        match validated.command {
            ValidatedCommand::Scan { priority, .. } => assert_eq!(priority, Priority::Normal),
        }
    }

    #[test]
    fn bad_symlink_policy_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = scan_cli(dir.path().to_path_buf());
        if let Commands::Scan { symlinks, .. } = &mut cli.command {
            *symlinks = "explode".to_string();
        }
        let err = validate(cli).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = scan_cli(dir.path().to_path_buf());
        if let Commands::Scan { chunk_size, .. } = &mut cli.command {
            *chunk_size = Some(0);
        }
        let err = validate(cli).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = scan_cli(dir.path().to_path_buf());
        if let Commands::Scan { batch_size, .. } = &mut cli.command {
            *batch_size = Some(0);
        }
        let err = validate(cli).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
    }

    #[test]
    fn control_character_in_glob_is_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = scan_cli(dir.path().to_path_buf());
        if let Commands::Scan { include, .. } = &mut cli.command {
            include.push("*.txt\u{0007}".to_string());
        }
        let err = validate(cli).unwrap_err();
        assert!(matches!(err, ParseError::UnsafeArgument(_)));
    }
}
