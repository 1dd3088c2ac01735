// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests excluded from tracking entirely.

use crate::test_id::TestId;
use std::collections::BTreeMap;

/// Tests that are never run and never tracked in the baseline.
///
/// These are problems with the suite itself, or features the suite does not support. The
/// list is fixed for the lifetime of a process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IgnoreList {
    // Maps each ignored test to the reason it's ignored, if one was given.
    tests: BTreeMap<TestId, Option<String>>,
}

/// Tests ignored out of the box.
const BUILTIN_IGNORES: &[(&str, &str)] = &[
    (
        "rollup@function@circular-default-exports: handles circular default exports",
        "the input is not valid JavaScript",
    ),
    (
        "rollup@function@dynamic-import-rewriting: Dynamic import string specifier resolving",
        "dynamic import rewriting is not supported",
    ),
    (
        "rollup@function@deprecated@dynamic-import-name-warn: warns when specifying a custom \
         importer function for formats other than \"es\"",
        "custom dynamic import functions are not supported",
    ),
    (
        "rollup@function@import-assertions@plugin-assertions-this-resolve: allows plugins to \
         provide assertions for this.resolve",
        "import assertions are not supported",
    ),
];

impl IgnoreList {
    /// Creates an empty ignore list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the ignore list compiled into failgate.
    pub fn builtin() -> Self {
        BUILTIN_IGNORES
            .iter()
            .map(|(id, reason)| (TestId::new(*id), Some((*reason).to_owned())))
            .collect()
    }

    /// Adds a test to the list.
    ///
    /// If the test is already present, a newly provided reason replaces the old one.
    pub fn insert(&mut self, id: TestId, reason: Option<String>) {
        match self.tests.get_mut(&id) {
            Some(existing) => {
                if reason.is_some() {
                    *existing = reason;
                }
            }
            None => {
                self.tests.insert(id, reason);
            }
        }
    }

    /// Returns true if the test is ignored.
    pub fn contains(&self, id: &TestId) -> bool {
        self.tests.contains_key(id)
    }

    /// Returns the reason a test is ignored, if it is ignored and a reason was given.
    pub fn reason(&self, id: &TestId) -> Option<&str> {
        self.tests.get(id).and_then(|reason| reason.as_deref())
    }

    /// Returns the number of ignored tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no tests are ignored.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over ignored tests and their reasons, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&TestId, Option<&str>)> + '_ {
        self.tests
            .iter()
            .map(|(id, reason)| (id, reason.as_deref()))
    }
}

impl FromIterator<(TestId, Option<String>)> for IgnoreList {
    fn from_iter<T: IntoIterator<Item = (TestId, Option<String>)>>(iter: T) -> Self {
        let mut list = Self::empty();
        for (id, reason) in iter {
            list.insert(id, reason);
        }
        list
    }
}
