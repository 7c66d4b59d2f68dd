// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Configuration
//!
//! Layered configuration for every tunable named in the component design
//! (buffer pool sizing, worker-pool widths, batch admission/adaptive sizing,
//! scan defaults). Built with the `config` crate over an optional TOML file,
//! then overridden by the environment variables named in the
//! external-interfaces contract (`BACKUP_THREADS_IO`, `BACKUP_THREADS_CPU`,
//! `BACKUP_BUFFER_MAX_MB`, `BACKUP_BUFFER_CAP_KB`). Built once in the
//! bootstrap composition root and passed down as a constructor argument —
//! never read from a hidden global.

use backup_core_domain::value_objects::{BatchStrategy, ChunkSize};
use backup_core_domain::CoreError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub chunk_size_bytes: usize,
    pub max_concurrent_chunks: usize,
    pub use_async_io: bool,

    pub buffer_min_class_kb: usize,
    pub buffer_max_class_kb: usize,
    pub buffer_max_mb: usize,

    pub threads_io: usize,
    pub threads_cpu: usize,

    pub max_concurrent_batches: usize,
    pub adaptive_sizing: bool,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub batch_strategy: BatchStrategy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self {
            chunk_size_bytes: backup_core_domain::value_objects::chunk_size::DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: 4,
            use_async_io: true,
            buffer_min_class_kb: 1,
            buffer_max_class_kb: 1024,
            buffer_max_mb: 256,
            threads_io: cores * 4,
            threads_cpu: cores,
            max_concurrent_batches: cores.max(1),
            adaptive_sizing: true,
            min_batch_size: 1,
            max_batch_size: 256,
            batch_strategy: BatchStrategy::default(),
        }
    }
}

impl CoreConfig {
    /// Loads defaults, then an optional TOML file at `path`, then environment
    /// variable overrides, in that order of increasing precedence.
    pub fn load(path: Option<&str>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("chunk_size_bytes", defaults.chunk_size_bytes as i64)
            .map_err(config_err)?
            .set_default("max_concurrent_chunks", defaults.max_concurrent_chunks as i64)
            .map_err(config_err)?
            .set_default("use_async_io", defaults.use_async_io)
            .map_err(config_err)?
            .set_default("buffer_min_class_kb", defaults.buffer_min_class_kb as i64)
            .map_err(config_err)?
            .set_default("buffer_max_class_kb", defaults.buffer_max_class_kb as i64)
            .map_err(config_err)?
            .set_default("buffer_max_mb", defaults.buffer_max_mb as i64)
            .map_err(config_err)?
            .set_default("threads_io", defaults.threads_io as i64)
            .map_err(config_err)?
            .set_default("threads_cpu", defaults.threads_cpu as i64)
            .map_err(config_err)?
            .set_default("max_concurrent_batches", defaults.max_concurrent_batches as i64)
            .map_err(config_err)?
            .set_default("adaptive_sizing", defaults.adaptive_sizing)
            .map_err(config_err)?
            .set_default("min_batch_size", defaults.min_batch_size as i64)
            .map_err(config_err)?
            .set_default("max_batch_size", defaults.max_batch_size as i64)
            .map_err(config_err)?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("BACKUP")
                .try_parsing(true)
                .separator("_"),
        );

        let settled = builder.build().map_err(config_err)?;

        Ok(Self {
            chunk_size_bytes: settled.get("chunk_size_bytes").unwrap_or(defaults.chunk_size_bytes),
            max_concurrent_chunks: settled
                .get("max_concurrent_chunks")
                .unwrap_or(defaults.max_concurrent_chunks),
            use_async_io: settled.get("use_async_io").unwrap_or(defaults.use_async_io),
            buffer_min_class_kb: settled
                .get("buffer_min_class_kb")
                .unwrap_or(defaults.buffer_min_class_kb),
            buffer_max_class_kb: settled
                .get("buffer_cap_kb")
                .or_else(|_| settled.get("buffer_max_class_kb"))
                .unwrap_or(defaults.buffer_max_class_kb),
            buffer_max_mb: settled.get("buffer_max_mb").unwrap_or(defaults.buffer_max_mb),
            threads_io: settled.get("threads_io").unwrap_or(defaults.threads_io),
            threads_cpu: settled.get("threads_cpu").unwrap_or(defaults.threads_cpu),
            max_concurrent_batches: settled
                .get("max_concurrent_batches")
                .unwrap_or(defaults.max_concurrent_batches),
            adaptive_sizing: settled.get("adaptive_sizing").unwrap_or(defaults.adaptive_sizing),
            min_batch_size: settled.get("min_batch_size").unwrap_or(defaults.min_batch_size),
            max_batch_size: settled.get("max_batch_size").unwrap_or(defaults.max_batch_size),
            batch_strategy: defaults.batch_strategy,
        })
    }

    pub fn chunk_size(&self) -> Result<ChunkSize, CoreError> {
        ChunkSize::new(self.chunk_size_bytes)
    }
}

fn config_err(err: config::ConfigError) -> CoreError {
    CoreError::invalid_argument(format!("configuration error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = CoreConfig::load(None).unwrap();
        assert_eq!(cfg.chunk_size_bytes, CoreConfig::default().chunk_size_bytes);
    }

    #[test]
    fn env_override_wins_over_default() {
        std::env::set_var("BACKUP_THREADS_CPU", "2");
        let cfg = CoreConfig::load(None).unwrap();
        std::env::remove_var("BACKUP_THREADS_CPU");
        assert_eq!(cfg.threads_cpu, 2);
    }
}
