// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use failgate_runner::{
    controller::HarnessMode,
    lifecycle::{TestCase, TestDisposition},
    reporter::SummaryReporter,
    test_id::TestId,
};
use pretty_assertions::assert_eq;
use std::{collections::BTreeSet, sync::Arc};

fn many_tests(count: usize) -> Vec<Arc<FixtureTest>> {
    (0..count)
        .map(|i| {
            let status = if i % 3 == 0 {
                FixtureStatus::Fail
            } else {
                FixtureStatus::Pass
            };
            FixtureTest::new(&format!("suite-{}@test-{i}", i % 7), status)
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parallel_regression_run() -> Result<()> {
    let baseline = BaselineDir::new(&["suite-0@test-0"])?;
    let controller = baseline.controller(HarnessMode::Regression, &[])?;
    let tests = many_tests(200);

    let outcome = run_parallel(&controller, &tests, 8)?;

    assert_eq!(outcome.status.total, 200);
    assert_eq!(outcome.status.skip_failed, 1);
    assert_eq!(outcome.status.passed + outcome.status.failed, 199);
    assert_eq!(outcome.orphaned, BTreeSet::new());

    let expected: BTreeSet<TestId> = (0..200)
        .filter(|i| i % 3 == 0 && *i != 0)
        .map(|i| TestId::new(format!("suite-{}@test-{i}", i % 7)))
        .collect();
    assert_eq!(outcome.newly_failed, expected);
    assert_eq!(baseline.ids()?.len(), expected.len() + 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parallel_update_run() -> Result<()> {
    let tests = many_tests(90);
    let all: Vec<String> = tests.iter().map(|test| test.id()).collect();
    let ids: Vec<&str> = all.iter().map(String::as_str).collect();
    let baseline = BaselineDir::new(&ids)?;
    let controller = baseline.controller(HarnessMode::Update, &[])?;

    let outcome = run_parallel(&controller, &tests, 6)?;

    // Every third test still fails.
    assert_eq!(outcome.status.failed, 30);
    assert_eq!(outcome.removed.len(), 60);
    assert_eq!(baseline.ids()?.len(), 30);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn overlapping_duplicate_ids() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    let controller = baseline.controller(HarnessMode::Regression, &[])?;

    // Two tests with the same title path, in flight at the same time.
    let first = FixtureTest::new("dup@title", FixtureStatus::Pass);
    let second = FixtureTest::new("dup@title", FixtureStatus::Fail);
    let first_dyn: Arc<dyn TestCase> = first.clone();
    let second_dyn: Arc<dyn TestCase> = second.clone();

    assert_eq!(controller.before_each(&first_dyn)?, TestDisposition::Run);
    assert_eq!(controller.before_each(&second_dyn)?, TestDisposition::Run);
    first.execute().await;
    controller.after_each(&first_dyn)?;
    second.execute().await;
    controller.after_each(&second_dyn)?;

    let outcome = controller.after(&SummaryReporter::new(), std::io::sink())?;

    assert_eq!(outcome.status.total, 2);
    assert_eq!(outcome.status.passed, 1);
    assert_eq!(outcome.status.failed, 1);
    assert_eq!(baseline.ids()?, vec!["dup@title"]);
    Ok(())
}
