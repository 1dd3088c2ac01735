// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use failgate_runner::controller::HarnessMode;
use proptest::{collection::btree_set, prelude::*};
use std::{collections::BTreeSet, sync::Arc};
use test_strategy::{Arbitrary, proptest};

const TEST_COUNT: usize = 8;

#[derive(Clone, Copy, Debug, Arbitrary)]
enum Outcome {
    Pass,
    Fail,
    Vanish,
}

impl Outcome {
    fn fixture_status(self) -> FixtureStatus {
        match self {
            Self::Pass => FixtureStatus::Pass,
            Self::Fail => FixtureStatus::Fail,
            Self::Vanish => FixtureStatus::Vanish,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct RunModel {
    #[strategy(btree_set(0..TEST_COUNT, 0..TEST_COUNT))]
    baseline: BTreeSet<usize>,
    #[strategy(btree_set(0..TEST_COUNT, 0..3))]
    ignored: BTreeSet<usize>,
    outcomes: [Outcome; TEST_COUNT],
}

struct RunResult {
    before: BTreeSet<String>,
    after: BTreeSet<String>,
    executed: usize,
    total: usize,
}

fn test_name(index: usize) -> String {
    format!("suite@test-{index}")
}

impl RunModel {
    fn names(indexes: &BTreeSet<usize>) -> Vec<String> {
        indexes.iter().map(|&i| test_name(i)).collect()
    }

    fn tests(&self) -> Vec<Arc<FixtureTest>> {
        self.outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| FixtureTest::new(&test_name(i), outcome.fixture_status()))
            .collect()
    }

    fn run(&self, mode: HarnessMode) -> RunResult {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let baseline_names = Self::names(&self.baseline);
            let baseline_refs: Vec<&str> = baseline_names.iter().map(String::as_str).collect();
            let ignored_names = Self::names(&self.ignored);
            let ignored_refs: Vec<&str> = ignored_names.iter().map(String::as_str).collect();

            let dir = BaselineDir::new(&baseline_refs).unwrap();
            let controller = dir.controller(mode, &ignored_refs).unwrap();
            let outcome = run_sequential(&controller, &self.tests()).await.unwrap();

            RunResult {
                before: baseline_names.into_iter().collect(),
                after: dir.ids().unwrap().into_iter().collect(),
                executed: outcome.status.passed + outcome.status.failed,
                total: outcome.status.total,
            }
        })
    }
}

#[proptest(cases = 64)]
fn regression_mode_only_grows(model: RunModel) {
    let RunResult {
        before,
        after,
        executed,
        total,
    } = model.run(HarnessMode::Regression);
    prop_assert!(before.is_subset(&after));
    prop_assert!(executed <= total);

    // Exactly the failures outside the baseline and the ignore list were added.
    let expected_added: BTreeSet<String> = model
        .outcomes
        .iter()
        .enumerate()
        .filter(|(i, outcome)| {
            matches!(outcome, Outcome::Fail)
                && !model.baseline.contains(i)
                && !model.ignored.contains(i)
        })
        .map(|(i, _)| test_name(i))
        .collect();
    prop_assert_eq!(
        after.difference(&before).cloned().collect::<BTreeSet<_>>(),
        expected_added
    );
}

#[proptest(cases = 64)]
fn update_mode_only_shrinks(model: RunModel) {
    let RunResult {
        before,
        after,
        executed,
        total,
    } = model.run(HarnessMode::Update);
    prop_assert!(after.is_subset(&before));
    prop_assert!(executed <= total);

    // Exactly the passing, non-ignored known failures were removed.
    let expected_removed: BTreeSet<String> = model
        .baseline
        .iter()
        .filter(|&&i| matches!(model.outcomes[i], Outcome::Pass) && !model.ignored.contains(&i))
        .map(|&i| test_name(i))
        .collect();
    prop_assert_eq!(
        before.difference(&after).cloned().collect::<BTreeSet<_>>(),
        expected_removed
    );
}

#[proptest(cases = 32)]
fn regression_rerun_is_stable(model: RunModel) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    runtime.block_on(async {
        let dir = BaselineDir::new(&[]).unwrap();
        run_sequential(
            &dir.controller(HarnessMode::Regression, &[]).unwrap(),
            &model.tests(),
        )
        .await
        .unwrap();
        let first = dir.contents().unwrap();

        let second = run_sequential(
            &dir.controller(HarnessMode::Regression, &[]).unwrap(),
            &model.tests(),
        )
        .await
        .unwrap();
        prop_assert!(second.newly_failed.is_empty());
        prop_assert_eq!(dir.contents().unwrap(), first);
        Ok(())
    })?;
}
