// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use failgate_metadata::FailgateExitCode;
use failgate_runner::{controller::HarnessMode, status::RunStatus, test_id::TestId};
use maplit::btreeset;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn passing_known_failure_is_removed() -> Result<()> {
    let baseline = BaselineDir::new(&["x@y"])?;
    let controller = baseline.controller(HarnessMode::Update, &[])?;

    let outcome =
        run_sequential(&controller, &[FixtureTest::new("x@y", FixtureStatus::Pass)]).await?;

    assert_eq!(outcome.removed, btreeset! {TestId::new("x@y")});
    assert_eq!(outcome.baseline_after, 0);
    assert_eq!(baseline.contents()?, "[]");
    Ok(())
}

#[tokio::test]
async fn only_known_failures_run() -> Result<()> {
    let baseline = BaselineDir::new(&["fixed@now", "still@broken", "ignored@known"])?;
    let controller = baseline.controller(HarnessMode::Update, &["ignored@known"])?;

    let fixed = FixtureTest::new("fixed@now", FixtureStatus::Pass);
    let broken = FixtureTest::new("still@broken", FixtureStatus::Fail);
    let ignored = FixtureTest::new("ignored@known", FixtureStatus::Pass);
    let unrelated = FixtureTest::new("unrelated@test", FixtureStatus::Fail);
    let outcome = run_sequential(
        &controller,
        &[
            fixed.clone(),
            broken.clone(),
            ignored.clone(),
            unrelated.clone(),
        ],
    )
    .await?;

    ensure!(fixed.executed() && broken.executed(), "known failures run");
    ensure!(
        !ignored.executed() && !unrelated.executed(),
        "ignored and unrelated tests are skipped"
    );
    assert_eq!(
        outcome.status,
        RunStatus {
            total: 4,
            failed: 1,
            ignored: 1,
            skipped: 1,
            passed: 1,
            ..RunStatus::default()
        }
    );
    assert_eq!(outcome.exit_code(), FailgateExitCode::OK);
    assert_eq!(baseline.ids()?, vec!["ignored@known", "still@broken"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hung_known_failure_stays() -> Result<()> {
    let baseline = BaselineDir::new(&["slow@test"])?;
    let controller = baseline.controller(HarnessMode::Update, &[])?;

    let outcome = run_sequential(
        &controller,
        &[FixtureTest::new("slow@test", FixtureStatus::Hang)],
    )
    .await?;

    assert_eq!(outcome.timed_out, btreeset! {TestId::new("slow@test")});
    assert_eq!(outcome.removed, btreeset! {});
    assert_eq!(baseline.ids()?, vec!["slow@test"]);
    Ok(())
}
