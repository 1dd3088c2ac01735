// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stable identifiers for tests, derived from their title paths.

use crate::errors::InvalidTestContext;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

/// The separator placed between the segments of a title path.
pub const TEST_ID_SEPARATOR: char = '@';

/// A stable key for a test: its ancestor suite titles followed by its own title, joined with
/// [`TEST_ID_SEPARATOR`].
///
/// Two tests with the same title path in the same run produce the same identifier and cannot be
/// told apart.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    /// Creates a test identifier from an already-joined string, for example an entry read from
    /// a baseline file.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Computes the identifier for a test from its title path, ordered from the outermost suite
    /// to the test itself.
    ///
    /// Returns [`InvalidTestContext`] if the path is empty, which is what an engine reports when
    /// a hook fires outside of a test.
    pub fn from_title_path<I, S>(titles: I) -> Result<Self, InvalidTestContext>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut id = String::new();
        let mut segments = 0usize;
        for title in titles {
            if segments > 0 {
                id.push(TEST_ID_SEPARATOR);
            }
            id.push_str(title.as_ref());
            segments += 1;
        }

        if segments == 0 {
            return Err(InvalidTestContext::new());
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
