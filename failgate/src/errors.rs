// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use failgate_metadata::FailgateExitCode;
use failgate_runner::errors::{BaselineLoadError, BaselinePersistError, ConfigParseError};
use owo_colors::OwoColorize;
use std::{error::Error, io, path::PathBuf};
use swrite::{SWrite, swrite};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders. Errors are meant to be printed with
// display_to_stderr, which adds color and the chain of causes.

/// An expected error that failgate reports to the user, as opposed to a bug in failgate.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed { error: io::Error },
    #[error("root directory is not valid UTF-8")]
    RootNotUtf8 { path: PathBuf },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("baseline load error")]
    BaselineLoadError {
        #[from]
        err: BaselineLoadError,
    },
    #[error("baseline persist error")]
    BaselinePersistError {
        #[from]
        err: BaselinePersistError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: io::Error,
    },
    #[error("error serializing output")]
    SerializeOutputError {
        #[source]
        err: serde_json::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output(err: io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    pub(crate) fn serialize_output(err: serde_json::Error) -> Self {
        Self::SerializeOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::RootNotUtf8 { .. }
            | Self::ConfigParseError { .. } => FailgateExitCode::SETUP_ERROR,
            Self::BaselineLoadError { .. } => FailgateExitCode::BASELINE_LOAD_FAILED,
            Self::BaselinePersistError { .. } => FailgateExitCode::BASELINE_PERSIST_FAILED,
            Self::WriteOutputError { .. } | Self::SerializeOutputError { .. } => {
                FailgateExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let next_error: Option<&dyn Error> = match self {
            Self::CurrentDirFailed { error } => {
                tracing::error!("could not determine the current directory");
                Some(error)
            }
            Self::RootNotUtf8 { path } => {
                tracing::error!(
                    "root directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse failgate config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::BaselineLoadError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::BaselinePersistError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write output");
                Some(err)
            }
            Self::SerializeOutputError { err } => {
                tracing::error!("failed to serialize output");
                Some(err)
            }
        };

        if let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "{}", error_chain(err, styles));
        }
    }
}

fn error_chain(err: &dyn Error, styles: &StderrStyles) -> String {
    let mut s = String::with_capacity(256);
    swrite!(s, "  {} {}", "caused by:".style(styles.warning_text), err);
    let mut next_error = err.source();
    while let Some(err) = next_error {
        swrite!(s, "\n  {} {}", "caused by:".style(styles.warning_text), err);
        next_error = err.source();
    }
    s
}
