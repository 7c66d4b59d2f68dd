// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Logging
//!
//! Structured logging for every component, built on `tracing` +
//! `tracing-subscriber`. `debug!` for per-chunk/per-file detail, `info!` for
//! batch- and scan-level milestones, `warn!` for recoverable per-entry
//! failures, `error!` for batch/scan-terminal failures — the density the
//! rest of this workspace uses for its own runtime components.

use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, for an interactive terminal.
    Pretty,
    /// Newline-delimited JSON, for log aggregation in non-interactive runs.
    Json,
}

/// Installs the global `tracing` subscriber. Must be called at most once,
/// from the bootstrap entry point, before any other component logs.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Pretty => {
            builder.pretty().init();
        }
        LogFormat::Json => {
            builder.json().init();
        }
    }
}
