// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage and retrieval of the baseline of known-failing tests.
//!
//! The baseline is a JSON array of test identifiers, pretty-printed with two-space indentation.
//! It is always written sorted and without duplicates, and always written atomically.

use crate::{
    errors::{BaselineLoadError, BaselinePersistError},
    test_id::TestId,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fs, io::Write};

/// The default file name of the baseline.
pub const DEFAULT_BASELINE_FILE_NAME: &str = "failed-tests.json";

/// A set of test identifiers accepted as failing.
///
/// Backed by an ordered set, so serialization is sorted and duplicate-free.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FailureBaseline {
    tests: BTreeSet<TestId>,
}

impl FailureBaseline {
    /// Creates an empty baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the test is a known failure.
    pub fn contains(&self, id: &TestId) -> bool {
        self.tests.contains(id)
    }

    /// Returns the number of known failures.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if there are no known failures.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over the known failures in sorted order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TestId> + '_ {
        self.tests.iter()
    }

    /// Returns a new baseline with `additions` added.
    pub fn union(&self, additions: &BTreeSet<TestId>) -> Self {
        Self {
            tests: self.tests.union(additions).cloned().collect(),
        }
    }

    /// Returns a new baseline with `removals` removed.
    pub fn difference(&self, removals: &BTreeSet<TestId>) -> Self {
        Self {
            tests: self.tests.difference(removals).cloned().collect(),
        }
    }

    /// Serializes the baseline in its canonical on-disk form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<TestId> for FailureBaseline {
    fn from_iter<T: IntoIterator<Item = TestId>>(iter: T) -> Self {
        Self {
            tests: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FailureBaseline {
    type Item = &'a TestId;
    type IntoIter = std::collections::btree_set::Iter<'a, TestId>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}

/// Manages persistence of the baseline.
///
/// This is the only writer of the baseline file.
#[derive(Clone, Debug)]
pub struct FailureBaselineStore {
    path: Utf8PathBuf,
}

impl FailureBaselineStore {
    /// Creates a new store for the baseline at the given path.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the baseline file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads the baseline from disk.
    ///
    /// A missing file is an empty baseline. A file that exists but is not a JSON array of strings
    /// is an error.
    pub fn load(&self) -> Result<FailureBaseline, BaselineLoadError> {
        match fs::read(&self.path) {
            Ok(contents) => {
                serde_json::from_slice(&contents).map_err(|error| BaselineLoadError::Corrupt {
                    path: self.path.clone(),
                    error,
                })
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Ok(FailureBaseline::new())
            }
            Err(error) => Err(BaselineLoadError::Read {
                path: self.path.clone(),
                error,
            }),
        }
    }

    /// Saves the baseline to disk, replacing the previous one.
    ///
    /// The file is written to a temporary location and renamed into place, so a failed write
    /// never leaves a partially written baseline behind.
    pub fn save(&self, baseline: &FailureBaseline) -> Result<(), BaselinePersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| BaselinePersistError::CreateDir {
                path: parent.to_owned(),
                error,
            })?;
        }

        let contents = baseline
            .to_json()
            .map_err(|error| BaselinePersistError::Serialize {
                path: self.path.clone(),
                error,
            })?;

        atomicwrites::AtomicFile::new(&self.path, atomicwrites::AllowOverwrite)
            .write(|file| file.write_all(contents.as_bytes()))
            .map_err(|error| BaselinePersistError::Write {
                path: self.path.clone(),
                error,
            })?;

        tracing::debug!(
            "wrote {} known failures to {}",
            baseline.len(),
            self.path
        );
        Ok(())
    }
}
