// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use failgate_metadata::FailgateExitCode;
use failgate_runner::{
    baseline::FailureBaselineStore,
    controller::{HarnessBuilder, HarnessMode},
    errors::{BaselineLoadError, HarnessError},
    status::RunStatus,
    test_id::TestId,
};
use indoc::indoc;
use maplit::btreeset;
use pretty_assertions::assert_eq;
use std::fs;
use tokio::runtime::Handle;

#[tokio::test]
async fn known_failure_is_skipped_before_execution() -> Result<()> {
    let baseline = BaselineDir::new(&["a@b"])?;
    let before = baseline.contents()?;
    let controller = baseline.controller(HarnessMode::Regression, &[])?;

    let known = FixtureTest::new("a@b", FixtureStatus::Fail);
    let passing = FixtureTest::new("c@d", FixtureStatus::Pass);
    let outcome = run_sequential(&controller, &[known.clone(), passing.clone()]).await?;

    ensure!(!known.executed(), "known failure must not execute");
    ensure!(passing.executed(), "other tests execute");
    assert_eq!(
        outcome.status,
        RunStatus {
            total: 2,
            skip_failed: 1,
            passed: 1,
            ..RunStatus::default()
        }
    );
    assert_eq!(outcome.newly_failed, btreeset! {});
    assert_eq!(outcome.exit_code(), FailgateExitCode::OK);
    assert_eq!(baseline.contents()?, before, "baseline is unchanged");
    Ok(())
}

#[tokio::test]
async fn new_failure_is_recorded() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    let controller = baseline.controller(HarnessMode::Regression, &[])?;

    let outcome = run_sequential(&controller, &[FixtureTest::new("x@y", FixtureStatus::Fail)])
        .await?;

    assert_eq!(outcome.newly_failed, btreeset! {TestId::new("x@y")});
    assert!(outcome.has_regression());
    assert_eq!(outcome.exit_code(), FailgateExitCode::REGRESSION_DETECTED);
    assert_eq!(
        baseline.contents()?,
        indoc! {r#"
            [
              "x@y"
            ]"#}
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hung_test_fails_with_timeout() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    let controller = baseline.controller(HarnessMode::Regression, &[])?;

    let hung = FixtureTest::new("x@y", FixtureStatus::Hang);
    let after = FixtureTest::new("x@z", FixtureStatus::Pass);
    let outcome = run_sequential(&controller, &[hung.clone(), after]).await?;

    let timeouts = hung.timeouts();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].id(), &TestId::new("x@y"));
    assert_eq!(timeouts[0].to_string(), "test timed out: [x@y]");

    assert_eq!(outcome.status.failed, 1);
    assert_eq!(outcome.status.passed, 1);
    assert_eq!(outcome.timed_out, btreeset! {TestId::new("x@y")});
    assert_eq!(outcome.newly_failed, btreeset! {TestId::new("x@y")});
    assert_eq!(baseline.ids()?, vec!["x@y"]);
    Ok(())
}

#[tokio::test]
async fn rerun_without_changes_is_byte_identical() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    let tests = || {
        vec![
            FixtureTest::new("suite@fails", FixtureStatus::Fail),
            FixtureTest::new("suite@passes", FixtureStatus::Pass),
            FixtureTest::new("other@fails", FixtureStatus::Fail),
        ]
    };

    let first = run_sequential(&baseline.controller(HarnessMode::Regression, &[])?, &tests())
        .await?;
    assert_eq!(first.newly_failed.len(), 2);
    let after_first = baseline.contents()?;

    let second = run_sequential(&baseline.controller(HarnessMode::Regression, &[])?, &tests())
        .await?;
    assert_eq!(second.newly_failed, btreeset! {});
    assert_eq!(second.status.skip_failed, 2);
    assert_eq!(second.exit_code(), FailgateExitCode::OK);
    assert_eq!(baseline.contents()?, after_first);
    Ok(())
}

#[tokio::test]
async fn ignored_tests_never_run() -> Result<()> {
    let baseline = BaselineDir::new(&["both@listed"])?;
    let controller =
        baseline.controller(HarnessMode::Regression, &["both@listed", "only@ignored"])?;

    let both = FixtureTest::new("both@listed", FixtureStatus::Fail);
    let ignored = FixtureTest::new("only@ignored", FixtureStatus::Fail);
    let outcome = run_sequential(&controller, &[both.clone(), ignored.clone()]).await?;

    ensure!(!both.executed() && !ignored.executed(), "ignored tests must not run");
    assert_eq!(
        outcome.status,
        RunStatus {
            total: 2,
            ignored: 2,
            skip_failed: 1,
            ..RunStatus::default()
        }
    );
    assert_eq!(baseline.ids()?, vec!["both@listed"]);
    Ok(())
}

#[tokio::test]
async fn vanished_test_is_not_a_failure() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    let controller = baseline.controller(HarnessMode::Regression, &[])?;

    let outcome = run_sequential(
        &controller,
        &[FixtureTest::new("crashed@worker", FixtureStatus::Vanish)],
    )
    .await?;

    assert_eq!(outcome.orphaned, btreeset! {TestId::new("crashed@worker")});
    assert_eq!(outcome.newly_failed, btreeset! {});
    assert_eq!(outcome.status.failed + outcome.status.passed, 0);
    assert_eq!(baseline.ids()?, Vec::<String>::new());
    Ok(())
}

#[tokio::test]
async fn missing_baseline_is_empty() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    fs::remove_file(baseline.path())?;

    let controller = baseline.controller(HarnessMode::Regression, &[])?;
    let outcome =
        run_sequential(&controller, &[FixtureTest::new("a@b", FixtureStatus::Pass)]).await?;

    assert_eq!(outcome.baseline_before, 0);
    assert_eq!(baseline.contents()?, "[]");
    Ok(())
}

#[tokio::test]
async fn corrupt_baseline_aborts_without_overwriting() -> Result<()> {
    let baseline = BaselineDir::new(&[])?;
    fs::write(baseline.path(), r#"{"not": "an array"}"#)?;

    let error = HarnessBuilder::new(HarnessMode::Regression)
        .build(FailureBaselineStore::new(baseline.path()), Handle::current())
        .unwrap_err();
    assert!(
        matches!(
            &error,
            HarnessError::BaselineLoad(BaselineLoadError::Corrupt { path, .. })
                if *path == baseline.path()
        ),
        "unexpected error: {error:?}"
    );
    assert_eq!(
        error.process_exit_code(),
        FailgateExitCode::BASELINE_LOAD_FAILED
    );
    assert_eq!(baseline.contents()?, r#"{"not": "an array"}"#);
    Ok(())
}
