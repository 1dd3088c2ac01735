// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for failgate-driven runs and the `failgate` maintenance tool.
///
/// A run may fail for a variety of reasons. This structure documents the exit codes that may
/// occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum FailgateExitCode {}

impl FailgateExitCode {
    /// No errors occurred and no new failures were observed.
    pub const OK: i32 = 0;

    /// A regression-mode run observed at least one failure that is not in the baseline.
    ///
    /// Known failures are skipped and never contribute to this exit code.
    pub const REGRESSION_DETECTED: i32 = 100;

    /// The baseline file exists but could not be read or parsed.
    pub const BASELINE_LOAD_FAILED: i32 = 102;

    /// Writing the baseline file failed. The previous baseline is left in place.
    pub const BASELINE_PERSIST_FAILED: i32 = 103;

    /// A lifecycle hook was invoked outside of a test, or after the run finished.
    pub const INVALID_TEST_CONTEXT: i32 = 104;

    /// Two baseline files compared with `failgate diff` differ.
    pub const BASELINE_DIFFERS: i32 = 5;

    /// A user issue happened while setting up a failgate invocation, for example a malformed
    /// configuration file.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
