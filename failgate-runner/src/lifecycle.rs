// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary between failgate and the test engine that drives it.
//!
//! The engine owns test execution. For every test it calls
//! [`HarnessController::before_each`](crate::controller::HarnessController::before_each) and
//! [`HarnessController::after_each`](crate::controller::HarnessController::after_each), passing
//! the test explicitly; once every test has finished it calls
//! [`HarnessController::after`](crate::controller::HarnessController::after).

use crate::errors::TestTimedOut;
use std::fmt;

/// The state of a test as reported by the engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TestState {
    /// The test has not finished yet.
    Pending,

    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test was skipped, either by failgate or by the engine.
    Skipped,
}

impl TestState {
    /// Returns true if the test passed or failed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// A test as exposed by the engine.
///
/// Implementations are shared with the timeout watchdog, which may call
/// [`force_fail`](Self::force_fail) from another thread while the test is running.
pub trait TestCase: Send + Sync {
    /// Returns the titles of the enclosing suites, outermost first, followed by the test's own
    /// title.
    fn title_path(&self) -> Vec<String>;

    /// Returns the current state of the test.
    fn state(&self) -> TestState;

    /// Prevents the test from executing. Only meaningful before the test starts.
    fn skip(&self);

    /// Fails a test that is still running.
    ///
    /// Called at most once per watchdog arm, and only if [`state`](Self::state) was not terminal
    /// at the time the bound elapsed.
    fn force_fail(&self, error: TestTimedOut);
}

/// Why failgate skipped a test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SkipReason {
    /// The test is in the ignore list.
    Ignored,

    /// The test is in the baseline of known failures (regression mode).
    KnownFailure,

    /// The test is both ignored and a known failure (regression mode). Both counters are
    /// incremented.
    IgnoredKnownFailure,

    /// The test is not in the baseline, so there is nothing to update (update mode).
    NotInBaseline,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => write!(f, "ignored"),
            Self::KnownFailure => write!(f, "known failure"),
            Self::IgnoredKnownFailure => write!(f, "ignored known failure"),
            Self::NotInBaseline => write!(f, "not in baseline"),
        }
    }
}

/// The decision made for a test in `before_each`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TestDisposition {
    /// The test runs, with the timeout watchdog armed.
    Run,

    /// The test was skipped.
    Skip(SkipReason),
}

impl TestDisposition {
    /// Returns true if the test was skipped.
    pub fn is_skip(self) -> bool {
        matches!(self, Self::Skip(_))
    }
}
