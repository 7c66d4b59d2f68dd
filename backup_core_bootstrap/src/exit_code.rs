// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! A small, closed set of exit codes for the `scan` binary. Unlike a BSD
//! `sysexits.h`-style scheme with dozens of categories, this crate only
//! distinguishes the outcomes callers (shell scripts, CI jobs) actually need
//! to branch on: argument mistakes, a missing scan root, cancellation, partial
//! failure, and everything else.

use backup_core_domain::{CoreError, ErrorCategory};

/// Process exit code returned by the `scan` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The scan completed and every file was processed successfully.
    Success = 0,
    /// An unexpected, unrecoverable error occurred.
    Fatal = 1,
    /// The command line arguments were invalid.
    InvalidArguments = 2,
    /// The scan root does not exist or is not a directory.
    RootNotFound = 3,
    /// The scan completed but one or more files failed to process.
    PartialSuccess = 4,
    /// The scan was canceled (e.g. by a shutdown signal).
    Canceled = 5,
}

impl ExitCode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Success => "scan completed successfully",
            Self::Fatal => "an unrecoverable error occurred",
            Self::InvalidArguments => "invalid command line arguments",
            Self::RootNotFound => "scan root not found or not a directory",
            Self::PartialSuccess => "scan completed with some file failures",
            Self::Canceled => "scan was canceled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Maps a top-level engine error to its exit code.
///
/// Per-file failures inside a scan never surface as a [`CoreError`] — they
/// are counted by the caller and reported via [`PartialSuccess`](ExitCode::PartialSuccess)
/// instead. This function only sees errors that aborted the run entirely.
pub fn map_error_to_exit_code(error: &CoreError) -> ExitCode {
    match error.category() {
        ErrorCategory::InvalidInput => ExitCode::InvalidArguments,
        ErrorCategory::NotFound => ExitCode::RootNotFound,
        ErrorCategory::Cancellation => ExitCode::Canceled,
        _ => ExitCode::Fatal,
    }
}

/// Converts an engine `Result` into an exit code, collapsing every error
/// variant down to [`map_error_to_exit_code`].
pub fn result_to_exit_code<T>(result: &Result<T, CoreError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(err) => map_error_to_exit_code(err),
    }
}

/// Chooses between success and partial success once the run itself didn't
/// abort: `failed_files > 0` means some files in the scan could not be
/// processed even though the engine completed.
pub fn exit_code_for_outcome(failed_files: usize) -> ExitCode {
    if failed_files == 0 {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_maps_to_invalid_arguments() {
        let err = CoreError::invalid_argument("bad flag");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::InvalidArguments);
    }

    #[test]
    fn not_found_maps_to_root_not_found() {
        let err = CoreError::not_found("/does/not/exist");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::RootNotFound);
    }

    #[test]
    fn canceled_maps_to_canceled() {
        let err = CoreError::canceled("shutdown requested");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::Canceled);
    }

    #[test]
    fn internal_maps_to_fatal() {
        let err = CoreError::internal("unexpected panic recovery");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::Fatal);
    }

    #[test]
    fn outcome_with_no_failures_is_success() {
        assert_eq!(exit_code_for_outcome(0), ExitCode::Success);
    }

    #[test]
    fn outcome_with_failures_is_partial_success() {
        assert_eq!(exit_code_for_outcome(3), ExitCode::PartialSuccess);
    }

    #[test]
    fn codes_round_trip_to_i32() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Fatal), 1);
        assert_eq!(i32::from(ExitCode::InvalidArguments), 2);
        assert_eq!(i32::from(ExitCode::RootNotFound), 3);
        assert_eq!(i32::from(ExitCode::PartialSuccess), 4);
        assert_eq!(i32::from(ExitCode::Canceled), 5);
    }
}
