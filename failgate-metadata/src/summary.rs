// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::FailgateExitCode;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// The mode a run was performed in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarnessModeSummary {
    /// Known failures are skipped and new failures are added to the baseline.
    Regression,

    /// Only known failures are run, and the ones that pass are removed from the baseline.
    Update,
}

impl fmt::Display for HarnessModeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regression => write!(f, "regression"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Counters accumulated over a single run.
///
/// `skip-failed` and `ignored` are independent observations: a test that is both ignored and a
/// known failure increments both, so the counters do not necessarily sum to `total`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunStatusSummary {
    /// Tests seen by the harness.
    pub total: usize,

    /// Tests that executed and failed, including tests that timed out.
    pub failed: usize,

    /// Tests skipped because they were in the baseline.
    pub skip_failed: usize,

    /// Tests skipped because they were in the ignore list.
    pub ignored: usize,

    /// Tests skipped for any other reason.
    pub skipped: usize,

    /// Tests that executed and passed.
    pub passed: usize,
}

/// The machine-readable summary written at the end of a run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunSummary {
    /// The version of this document's format.
    pub format_version: u32,

    /// The mode the run was performed in.
    pub mode: HarnessModeSummary,

    /// Run counters.
    pub status: RunStatusSummary,

    /// The baseline file that was read and rewritten.
    pub baseline_path: String,

    /// Number of identifiers in the baseline when the run started.
    pub baseline_before: usize,

    /// Number of identifiers in the baseline written at the end of the run.
    pub baseline_after: usize,

    /// Failures not present in the baseline when the run started.
    #[serde(default)]
    pub newly_failed: BTreeSet<String>,

    /// Identifiers removed from the baseline (update mode only).
    #[serde(default)]
    pub removed: BTreeSet<String>,

    /// Tests that were failed by the harness because they did not finish in time.
    #[serde(default)]
    pub timed_out: BTreeSet<String>,

    /// Tests that started but never reported a terminal state.
    #[serde(default)]
    pub orphaned: BTreeSet<String>,
}

impl RunSummary {
    /// The current format version.
    pub const FORMAT_VERSION: u32 = 1;

    /// Returns true if this run found a regression.
    pub fn has_regression(&self) -> bool {
        self.mode == HarnessModeSummary::Regression && !self.newly_failed.is_empty()
    }

    /// Returns the process exit code a CI invocation should use for this run.
    pub fn exit_code(&self) -> i32 {
        if self.has_regression() {
            FailgateExitCode::REGRESSION_DETECTED
        } else {
            FailgateExitCode::OK
        }
    }
}

/// A listing of a baseline file, produced by `failgate show --message-format json`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BaselineSummary {
    /// The path the baseline was read from.
    pub path: String,

    /// Number of identifiers in the baseline.
    pub count: usize,

    /// The identifiers, in sorted order.
    pub tests: BTreeSet<String>,
}

/// The difference between two baseline files, produced by `failgate diff`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BaselineDiffSummary {
    /// The older baseline.
    pub old_path: String,

    /// The newer baseline.
    pub new_path: String,

    /// Identifiers present in the new baseline but not the old one.
    pub added: BTreeSet<String>,

    /// Identifiers present in the old baseline but not the new one.
    pub removed: BTreeSet<String>,
}

impl BaselineDiffSummary {
    /// Returns true if the two baselines contain the same identifiers.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
