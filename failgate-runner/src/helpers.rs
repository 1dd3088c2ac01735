// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small formatting helpers.

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "known failure" if `count` is 1, otherwise "known failures".
    pub fn known_failures_str(count: usize) -> &'static str {
        if count == 1 {
            "known failure"
        } else {
            "known failures"
        }
    }
}
