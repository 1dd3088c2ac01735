// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome counters for a single run.

use failgate_metadata::RunStatusSummary;
use std::fmt;

/// A counter tracked by [`RunAccumulator`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum StatusCounter {
    /// A test was seen.
    Total,

    /// An executed test failed.
    Failed,

    /// A test was skipped because it is a known failure.
    SkipFailed,

    /// A test was skipped because it is ignored.
    Ignored,

    /// A test was skipped for another reason.
    Skipped,

    /// An executed test passed.
    Passed,
}

impl StatusCounter {
    /// All counters, in reporting order.
    pub const ALL: [Self; 6] = [
        Self::Total,
        Self::Failed,
        Self::SkipFailed,
        Self::Ignored,
        Self::Skipped,
        Self::Passed,
    ];

    /// The label used for this counter in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Failed => "failed",
            Self::SkipFailed => "skip-failed",
            Self::Ignored => "ignored",
            Self::Skipped => "skipped",
            Self::Passed => "passed",
        }
    }
}

impl fmt::Display for StatusCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A snapshot of the counters of a run.
///
/// `skip_failed` and `ignored` may both count the same skipped test, so the fields don't
/// necessarily add up to `total`. `passed + failed <= total` always holds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunStatus {
    /// Tests seen.
    pub total: usize,
    /// Executed tests that failed, including timeouts.
    pub failed: usize,
    /// Tests skipped as known failures.
    pub skip_failed: usize,
    /// Tests skipped as ignored.
    pub ignored: usize,
    /// Tests skipped for any other reason.
    pub skipped: usize,
    /// Executed tests that passed.
    pub passed: usize,
}

impl RunStatus {
    /// Returns the value of a counter.
    pub fn get(&self, counter: StatusCounter) -> usize {
        match counter {
            StatusCounter::Total => self.total,
            StatusCounter::Failed => self.failed,
            StatusCounter::SkipFailed => self.skip_failed,
            StatusCounter::Ignored => self.ignored,
            StatusCounter::Skipped => self.skipped,
            StatusCounter::Passed => self.passed,
        }
    }

    /// Converts this snapshot to its machine-readable form.
    pub fn to_summary(&self) -> RunStatusSummary {
        RunStatusSummary {
            total: self.total,
            failed: self.failed,
            skip_failed: self.skip_failed,
            ignored: self.ignored,
            skipped: self.skipped,
            passed: self.passed,
        }
    }
}

/// Accumulates counters over a run.
///
/// Callers serialize access; in the harness, this lives behind the run state mutex.
#[derive(Debug, Default)]
pub struct RunAccumulator {
    status: RunStatus,
}

impl RunAccumulator {
    /// Creates an accumulator with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments a counter by one.
    pub fn increment(&mut self, counter: StatusCounter) {
        let slot = match counter {
            StatusCounter::Total => &mut self.status.total,
            StatusCounter::Failed => &mut self.status.failed,
            StatusCounter::SkipFailed => &mut self.status.skip_failed,
            StatusCounter::Ignored => &mut self.status.ignored,
            StatusCounter::Skipped => &mut self.status.skipped,
            StatusCounter::Passed => &mut self.status.passed,
        };
        *slot += 1;
    }

    /// Returns the current counters.
    pub fn snapshot(&self) -> RunStatus {
        self.status
    }
}
