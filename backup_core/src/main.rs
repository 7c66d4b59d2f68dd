// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # `backup-core` binary
//!
//! The composition root: parses and validates CLI arguments via
//! `backup_core_bootstrap`, builds every adapter named in `lib.rs`'s module
//! table, wires them into a [`ScanCommand`], and maps the outcome to one of
//! the exit codes in spec §6.

use std::path::PathBuf;
use std::sync::Arc;

use backup_core::infrastructure::config::CoreConfig;
use backup_core::infrastructure::logging::{init_logging, LogFormat};
use backup_core::infrastructure::manifest::{JsonLinesManifestWriter, ManifestWriter};
use backup_core::infrastructure::metrics::MetricsService;
use backup_core::infrastructure::runtime::batch_scheduler::DefaultBatchScheduler;
use backup_core::infrastructure::runtime::buffer_pool::{BufferPoolConfig, DirectBufferPool};
use backup_core::infrastructure::runtime::chunk_handler::RayonChunkHandler;
use backup_core::infrastructure::runtime::file_chunker::OverlappedFileChunker;
use backup_core::infrastructure::runtime::hash_function::Sha256HashFunction;
use backup_core::infrastructure::runtime::worker_pool::RayonWorkerPoolManager;
use backup_core::infrastructure::scanner::WalkdirScanner;
use backup_core::presentation::ScanCommand;
use backup_core_bootstrap::exit_code::{exit_code_for_outcome, map_error_to_exit_code, ExitCode};
use backup_core_bootstrap::shutdown::ShutdownCoordinator;
use backup_core_bootstrap::signals::create_signal_handler;
use backup_core_bootstrap::{bootstrap_cli, ValidatedCommand};
use backup_core_domain::services::{BatchScheduler, BatchSchedulerConfig, WorkerPoolManager};
use backup_core_domain::value_objects::ChunkingOptions;
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("backup-core: {err}");
            return err.exit_code().into();
        }
    };

    init_logging(if cli.verbose { LogFormat::Pretty } else { LogFormat::Json });

    let code = run(cli).await;
    info!(exit_code = %code, "backup-core exiting");
    code.into()
}

async fn run(cli: backup_core_bootstrap::ValidatedCli) -> ExitCode {
    let ValidatedCommand::Scan {
        root,
        scan_options,
        chunk_size,
        use_async_io,
        batch_size,
        max_concurrent_batches,
        priority,
        batch_strategy,
    } = cli.command;

    let config = match CoreConfig::load(cli.config.as_deref().and_then(|p| p.to_str())) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            return map_error_to_exit_code(&err);
        }
    };

    let chunking_options = {
        let mut builder = ChunkingOptions::builder().max_concurrent_chunks(config.max_concurrent_chunks);
        if let Some(size) = chunk_size {
            builder = builder.chunk_size(size);
        } else {
            match config.chunk_size() {
                Ok(size) => builder = builder.chunk_size(size),
                Err(err) => return map_error_to_exit_code(&err),
            }
        }
        builder = builder.use_async_io(use_async_io.unwrap_or(config.use_async_io));
        builder.build()
    };

    let metrics = match MetricsService::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(err) => {
            error!(error = %err, "failed to initialize metrics");
            return map_error_to_exit_code(&err);
        }
    };

    let buffer_pool = Arc::new(DirectBufferPool::new(BufferPoolConfig {
        min_class_bytes: config.buffer_min_class_kb * 1024,
        max_class_bytes: config.buffer_max_class_kb * 1024,
        max_buffers: (config.buffer_max_mb * 1024) / config.buffer_min_class_kb.max(1),
        wait_on_exhaustion: true,
        acquire_timeout: None,
    }));

    let worker_pool = Arc::new(RayonWorkerPoolManager::new(config.threads_io, config.threads_cpu, Some(Arc::clone(&metrics))));
    let hash_function = Arc::new(Sha256HashFunction);
    let chunk_handler = Arc::new(RayonChunkHandler::new(Arc::clone(&hash_function) as _, config.max_concurrent_chunks));

    let file_chunker = Arc::new(OverlappedFileChunker::new(
        Arc::clone(&buffer_pool) as _,
        chunk_handler as _,
        hash_function as _,
        Arc::clone(&worker_pool) as _,
    ));

    let scheduler = Arc::new(DefaultBatchScheduler::new(
        Arc::clone(&file_chunker) as _,
        BatchSchedulerConfig {
            max_concurrent_batches: max_concurrent_batches.unwrap_or(config.max_concurrent_batches),
            adaptive_sizing: config.adaptive_sizing,
            min_batch_size: config.min_batch_size,
            max_batch_size: config.max_batch_size,
            strategy: batch_strategy,
        },
        Some(Arc::clone(&metrics)),
    ));

    let scanner = Arc::new(WalkdirScanner::new());
    let command = ScanCommand::new(scanner as _, Arc::clone(&scheduler) as _);

    let shutdown = Arc::new(ShutdownCoordinator::new(std::time::Duration::from_secs(5)));
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        create_signal_handler()
            .wait_for_signal(Box::new(move || signal_shutdown.initiate_shutdown()))
            .await;
    });

    let manifest_path = PathBuf::from("backup-core-manifest.jsonl");
    let mut manifest: Box<dyn ManifestWriter> = match JsonLinesManifestWriter::create(manifest_path.clone()).await {
        Ok(writer) => Box::new(writer),
        Err(err) => {
            error!(error = %err, path = %manifest_path.display(), "failed to open manifest file");
            return ExitCode::Fatal;
        }
    };

    let run_result = tokio::select! {
        result = command.run(&root, &scan_options, chunking_options, priority, batch_size.unwrap_or(config.max_batch_size), manifest.as_mut()) => result,
        _ = shutdown.token().cancelled() => {
            info!("shutdown signal received, canceling scan");
            Err(backup_core_domain::CoreError::canceled("scan canceled by shutdown signal"))
        }
    };

    scheduler.close().await;
    worker_pool.shutdown().await;
    if let Err(err) = manifest.finalize().await {
        error!(error = %err, "failed to finalize manifest");
    }

    match run_result {
        Ok(report) => {
            info!(summary = %report.summary_line(), "scan finished");
            for error in &report.errors {
                eprintln!("{}: {} ({})", error.path.display(), error.message, error.kind);
            }
            exit_code_for_outcome(report.files_failed)
        }
        Err(err) => {
            error!(error = %err, "scan aborted");
            map_error_to_exit_code(&err)
        }
    }
}
