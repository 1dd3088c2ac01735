// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by failgate.

use crate::test_id::TestId;
use camino::Utf8PathBuf;
use config::ConfigError;
use failgate_metadata::FailgateExitCode;
use std::io;
use thiserror::Error;

/// A lifecycle hook was invoked without a current test.
///
/// This is an integration error between the test engine and the harness, and aborts the run.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("lifecycle hook invoked without a current test (empty title path)")]
#[non_exhaustive]
pub struct InvalidTestContext {}

impl InvalidTestContext {
    pub(crate) fn new() -> Self {
        Self {}
    }
}

/// The failure handed to a test that neither passed nor failed within the watchdog bound.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("test timed out: [{id}]")]
pub struct TestTimedOut {
    id: TestId,
}

impl TestTimedOut {
    pub(crate) fn new(id: TestId) -> Self {
        Self { id }
    }

    /// Returns the identifier of the test that timed out.
    pub fn id(&self) -> &TestId {
        &self.id
    }
}

/// An error that occurred while loading the baseline of known failures.
#[derive(Debug, Error)]
pub enum BaselineLoadError {
    /// The baseline file exists but could not be read.
    #[error("failed to read baseline at `{path}`")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// The baseline file is not a JSON array of strings.
    ///
    /// This is never treated as an empty baseline, since that would hide every known failure
    /// and report them all as regressions (or, in update mode, silently drop them).
    #[error("baseline at `{path}` is corrupt (expected a JSON array of strings)")]
    Corrupt {
        /// The path that failed to parse.
        path: Utf8PathBuf,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurred while persisting the baseline of known failures.
///
/// Writes are atomic, so when this is returned the previous baseline is still intact.
#[derive(Debug, Error)]
pub enum BaselinePersistError {
    /// Error creating the directory containing the baseline.
    #[error("failed to create baseline directory `{path}`")]
    CreateDir {
        /// The directory path that failed to be created.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// Error serializing the baseline.
    #[error("failed to serialize baseline for `{path}`")]
    Serialize {
        /// The path the baseline was going to be written to.
        path: Utf8PathBuf,

        /// The underlying serialization error.
        #[source]
        error: serde_json::Error,
    },

    /// Error writing the baseline to disk.
    #[error("failed to write baseline to `{path}`")]
    Write {
        /// The path that failed to be written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<io::Error>,
    },
}

/// An error that occurred while parsing the failgate config.
#[derive(Debug, Error)]
#[error("failed to parse failgate config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// An error that aborts a harness run.
///
/// Per-test problems such as timeouts are folded into the run's counters instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A lifecycle hook was invoked without a current test.
    #[error(transparent)]
    InvalidTestContext(#[from] InvalidTestContext),

    /// The baseline could not be loaded.
    #[error(transparent)]
    BaselineLoad(#[from] BaselineLoadError),

    /// The baseline could not be persisted.
    #[error(transparent)]
    BaselinePersist(#[from] BaselinePersistError),

    /// A lifecycle event arrived after the run was reconciled.
    #[error("lifecycle event `{event}` received after the run finished")]
    RunFinished {
        /// The name of the event.
        event: &'static str,
    },

    /// A lifecycle handler panicked while holding the run state.
    #[error("run state mutex was poisoned by a panicking lifecycle handler")]
    StatePoisoned,

    /// Writing the end-of-run summary failed.
    #[error("failed to write run summary")]
    SummaryWrite(#[source] io::Error),

    /// Writing the machine-readable run summary file failed.
    #[error("failed to write run summary file `{path}`")]
    SummaryFileWrite {
        /// The path of the summary file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<io::Error>,
    },
}

impl HarnessError {
    /// Returns the exit code the surrounding process should use for this error.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::InvalidTestContext(_) | Self::RunFinished { .. } | Self::StatePoisoned => {
                FailgateExitCode::INVALID_TEST_CONTEXT
            }
            Self::BaselineLoad(_) => FailgateExitCode::BASELINE_LOAD_FAILED,
            Self::BaselinePersist(_) => FailgateExitCode::BASELINE_PERSIST_FAILED,
            Self::SummaryWrite(_) | Self::SummaryFileWrite { .. } => {
                FailgateExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }
}
