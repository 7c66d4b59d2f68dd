// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Core Error
//!
//! The single error type shared by every component of the scanning-and-chunking
//! core. Each variant names a failure kind that is meaningful to a caller
//! regardless of which component raised it (buffer pool, scanner, chunker,
//! batch scheduler, ...); none of them is tied to a particular language's
//! exception hierarchy.
//!
//! Per-file and per-entry failures are captured into the owning result type
//! (`ChunkingResult::Failure`, `ScanResult.errors`) rather than propagated as
//! this error; `CoreError` itself is reserved for failures that abort the
//! operation that raised them.

use thiserror::Error;

/// Coarse classification used for exit-code mapping and metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InvalidInput,
    NotFound,
    Permission,
    Resource,
    Io,
    Cancellation,
    Timeout,
    Lifecycle,
    Dependency,
    Internal,
}

/// Unified error type for the scanning-and-chunking core.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Bad sizes, null/empty inputs, nonexistent paths, invalid priorities.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A path vanished between enumeration and open.
    #[error("not found: {0}")]
    NotFound(String),

    /// The filesystem rejected access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A bounded resource (buffer pool, worker queue) has no headroom left.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A read, seek, or write failed, or returned fewer bytes than expected.
    #[error("I/O failure: {0}")]
    IoFailure(String),

    /// The operation was aborted by the caller.
    #[error("canceled: {0}")]
    Canceled(String),

    /// A deadline was exceeded.
    #[error("timed out: {0}")]
    TimedOut(String),

    /// The owning component has been shut down.
    #[error("closed: {0}")]
    Closed(String),

    /// A dependency referenced by a batch failed before this one could start.
    #[error("dependency failed: {0}")]
    DependencyFailed(String),

    /// An invariant was violated; always indicates a bug in this crate.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    pub fn io_failure(msg: impl Into<String>) -> Self {
        Self::IoFailure(msg.into())
    }

    pub fn canceled(msg: impl Into<String>) -> Self {
        Self::Canceled(msg.into())
    }

    pub fn timed_out(msg: impl Into<String>) -> Self {
        Self::TimedOut(msg.into())
    }

    pub fn closed(msg: impl Into<String>) -> Self {
        Self::Closed(msg.into())
    }

    pub fn dependency_failed(msg: impl Into<String>) -> Self {
        Self::DependencyFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Coarse classification, used by the CLI for exit-code mapping and by
    /// metrics for labeling without retaining the full message.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument(_) => ErrorCategory::InvalidInput,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::PermissionDenied(_) => ErrorCategory::Permission,
            Self::ResourceExhausted(_) => ErrorCategory::Resource,
            Self::IoFailure(_) => ErrorCategory::Io,
            Self::Canceled(_) => ErrorCategory::Cancellation,
            Self::TimedOut(_) => ErrorCategory::Timeout,
            Self::Closed(_) => ErrorCategory::Lifecycle,
            Self::DependencyFailed(_) => ErrorCategory::Dependency,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether retrying the same operation later could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Resource | ErrorCategory::Timeout | ErrorCategory::Io
        )
    }

    /// Whether this error reflects an access-control decision rather than a
    /// transient or programming failure.
    pub fn is_security_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Permission)
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            ErrorKind::TimedOut => Self::TimedOut(err.to_string()),
            _ => Self::IoFailure(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArgument(format!("malformed JSON: {err}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
