// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Manifest Writer
//!
//! Persists the fixed field set produced by a scan (`{path, size,
//! file_digest, chunk_size, chunks}`, one record per successfully chunked
//! file) behind a small [`ManifestWriter`] trait, since the caller chooses
//! the encoding rather than the engine (§6: manifest encoding is
//! caller-selectable; only the field set is fixed).
//!
//! Two implementations are provided:
//! - [`BinaryManifestWriter`]: each record is a `serde_json`-encoded blob
//!   framed by a 4-byte little-endian length prefix, so a reader never has
//!   to scan for a delimiter.
//! - [`JsonLinesManifestWriter`]: one JSON object per line, for callers that
//!   want to `grep`/`jq` the manifest directly.

use std::path::PathBuf;

use async_trait::async_trait;
use backup_core_domain::value_objects::{Chunk, Digest};
use backup_core_domain::CoreError;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// One manifest entry: everything needed to later verify or reconstruct a
/// scanned file from its chunk digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub path: PathBuf,
    pub size: u64,
    pub file_digest: Digest,
    pub chunk_size: u64,
    pub chunks: Vec<Chunk>,
}

#[async_trait]
pub trait ManifestWriter: Send + Sync {
    /// Appends one record. Implementations must not reorder or buffer past
    /// what's needed for their framing.
    async fn write_record(&mut self, record: &ManifestRecord) -> Result<(), CoreError>;

    /// Flushes and closes the underlying sink. Consumes `self` so a writer
    /// can't be used again after finalizing.
    async fn finalize(self: Box<Self>) -> Result<(), CoreError>;
}

/// Length-prefixed binary manifest: `[u32 LE record_len][record_len bytes]*`.
/// Each record's bytes are a `serde_json`-encoded [`ManifestRecord`]; the
/// length prefix lets a reader seek past a record without parsing it.
pub struct BinaryManifestWriter<W> {
    sink: BufWriter<W>,
}

impl BinaryManifestWriter<File> {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let file = File::create(path.into()).await?;
        Ok(Self { sink: BufWriter::new(file) })
    }
}

impl<W: AsyncWrite + Unpin> BinaryManifestWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink: BufWriter::new(sink) }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ManifestWriter for BinaryManifestWriter<W> {
    async fn write_record(&mut self, record: &ManifestRecord) -> Result<(), CoreError> {
        let encoded = serde_json::to_vec(record)?;
        let len = u32::try_from(encoded.len())
            .map_err(|_| CoreError::invalid_argument("manifest record too large to frame"))?;
        self.sink.write_all(&len.to_le_bytes()).await?;
        self.sink.write_all(&encoded).await?;
        Ok(())
    }

    async fn finalize(mut self: Box<Self>) -> Result<(), CoreError> {
        self.sink.flush().await?;
        Ok(())
    }
}

/// Line-delimited JSON manifest: one `ManifestRecord` per line.
pub struct JsonLinesManifestWriter<W> {
    sink: BufWriter<W>,
}

impl JsonLinesManifestWriter<File> {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let file = File::create(path.into()).await?;
        Ok(Self { sink: BufWriter::new(file) })
    }
}

impl<W: AsyncWrite + Unpin> JsonLinesManifestWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink: BufWriter::new(sink) }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ManifestWriter for JsonLinesManifestWriter<W> {
    async fn write_record(&mut self, record: &ManifestRecord) -> Result<(), CoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.sink.write_all(&line).await?;
        Ok(())
    }

    async fn finalize(mut self: Box<Self>) -> Result<(), CoreError> {
        self.sink.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ManifestRecord {
        ManifestRecord {
            path: PathBuf::from(name),
            size: 128,
            file_digest: Digest::new(vec![1, 2, 3, 4]),
            chunk_size: 64,
            chunks: vec![
                Chunk::new(0, 0, 64, Digest::new(vec![1])),
                Chunk::new(1, 64, 64, Digest::new(vec![2])),
            ],
        }
    }

    #[tokio::test]
    async fn binary_writer_frames_each_record_with_its_length() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut writer = BinaryManifestWriter::new(&mut buf);
            writer.write_record(&record("a.bin")).await.unwrap();
            writer.write_record(&record("b.bin")).await.unwrap();
            writer.sink.flush().await.unwrap();
        }

        let mut cursor = &buf[..];
        let mut seen = 0;
        while !cursor.is_empty() {
            let len = u32::from_le_bytes(cursor[0..4].try_into().unwrap()) as usize;
            cursor = &cursor[4..];
            let decoded: ManifestRecord = serde_json::from_slice(&cursor[..len]).unwrap();
            assert!(decoded.path == PathBuf::from("a.bin") || decoded.path == PathBuf::from("b.bin"));
            cursor = &cursor[len..];
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn json_lines_writer_emits_one_object_per_line() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut writer = JsonLinesManifestWriter::new(&mut buf);
            writer.write_record(&record("a.bin")).await.unwrap();
            writer.write_record(&record("b.bin")).await.unwrap();
            writer.sink.flush().await.unwrap();
        }

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let decoded: ManifestRecord = serde_json::from_str(line).unwrap();
            assert_eq!(decoded.chunks.len(), 2);
        }
    }
}
