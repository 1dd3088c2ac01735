// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The regression-tracking harness.
//!
//! [`HarnessController`] is driven by the engine's `before_each`, `after_each` and `after`
//! events, and operates in one of two modes:
//!
//! * **Regression mode** (the default) skips known failures, runs everything else, and adds any
//!   new failure to the baseline. A new failure is a regression, and makes the run fail.
//! * **Update mode** runs only known failures, and removes the ones that now pass from the
//!   baseline. It never adds to the baseline.
//!
//! The baseline is read once when the controller is built and written once in `after`. Between
//! those points all bookkeeping is in memory, behind a mutex so that engines may run tests
//! concurrently. Tests are correlated only by their identifiers.

use crate::{
    baseline::{FailureBaseline, FailureBaselineStore},
    config::HarnessConfig,
    errors::{HarnessError, TestTimedOut},
    ignore_list::IgnoreList,
    lifecycle::{SkipReason, TestCase, TestDisposition, TestState},
    reporter::SummaryReporter,
    status::{RunAccumulator, RunStatus, StatusCounter},
    test_id::TestId,
    watchdog::{DEFAULT_TIMEOUT, DisarmOutcome, TimeoutWatchdog, WatchdogToken},
};
use camino::{Utf8Path, Utf8PathBuf};
use failgate_metadata::{FailgateExitCode, HarnessModeSummary, RunSummary};
use itertools::Itertools;
use std::{
    collections::{BTreeSet, HashMap},
    ffi::OsStr,
    fmt,
    io::Write,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::runtime::Handle;

/// Which workflow the harness runs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum HarnessMode {
    /// Skip known failures and record new ones.
    #[default]
    Regression,

    /// Run known failures and drop the ones that pass.
    Update,
}

impl HarnessMode {
    /// The environment variable that selects update mode when set to `1`.
    pub const ENV_VAR: &'static str = "UPDATE_FAILED";

    /// Reads the mode from the environment.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(Self::ENV_VAR).as_deref())
    }

    /// Determines the mode from the value of [`Self::ENV_VAR`].
    ///
    /// Exactly `1` selects update mode. Anything else, including an unset variable, selects
    /// regression mode.
    pub fn from_env_value(value: Option<&OsStr>) -> Self {
        match value {
            Some(value) if value == "1" => Self::Update,
            _ => Self::Regression,
        }
    }

    /// Converts this mode to its machine-readable form.
    pub fn to_summary(self) -> HarnessModeSummary {
        match self {
            Self::Regression => HarnessModeSummary::Regression,
            Self::Update => HarnessModeSummary::Update,
        }
    }
}

impl fmt::Display for HarnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regression => write!(f, "regression"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Where the harness is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LifecycleState {
    /// No test has started yet.
    Idle,

    /// At least one lifecycle event has been seen.
    RunInProgress,

    /// `after` is reconciling and persisting the baseline.
    Reconciling,

    /// The baseline has been persisted. No further events are accepted.
    Done,
}

/// Builds a [`HarnessController`].
#[derive(Clone, Debug)]
pub struct HarnessBuilder {
    mode: HarnessMode,
    ignore_list: IgnoreList,
    timeout: Duration,
    summary_file: Option<Utf8PathBuf>,
}

impl HarnessBuilder {
    /// Creates a builder with the builtin ignore list and the default timeout.
    pub fn new(mode: HarnessMode) -> Self {
        Self {
            mode,
            ignore_list: IgnoreList::builtin(),
            timeout: DEFAULT_TIMEOUT,
            summary_file: None,
        }
    }

    /// Creates a builder from a loaded configuration.
    pub fn from_config(mode: HarnessMode, config: &HarnessConfig) -> Self {
        Self {
            mode,
            ignore_list: config.ignore_list(),
            timeout: config.timeout(),
            summary_file: config.summary_file(),
        }
    }

    /// Replaces the ignore list.
    pub fn set_ignore_list(&mut self, ignore_list: IgnoreList) -> &mut Self {
        self.ignore_list = ignore_list;
        self
    }

    /// Sets the per-test timeout bound.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Sets the path a machine-readable [`RunSummary`] is written to at the end of the run.
    pub fn set_summary_file(&mut self, summary_file: Option<Utf8PathBuf>) -> &mut Self {
        self.summary_file = summary_file;
        self
    }

    /// Loads the baseline and builds the controller.
    ///
    /// Timeout checks are spawned on `runtime`.
    pub fn build(
        self,
        store: FailureBaselineStore,
        runtime: Handle,
    ) -> Result<HarnessController, HarnessError> {
        let baseline = store.load()?;
        tracing::debug!(
            "loaded {} known failures from {} ({} mode)",
            baseline.len(),
            store.path(),
            self.mode,
        );

        Ok(HarnessController {
            mode: self.mode,
            store,
            baseline,
            ignore_list: self.ignore_list,
            watchdog: TimeoutWatchdog::new(self.timeout, runtime),
            summary_file: self.summary_file,
            state: Mutex::new(RunState::new()),
        })
    }
}

/// Applies the regression or update policy to the tests of a single run.
#[derive(Debug)]
pub struct HarnessController {
    mode: HarnessMode,
    store: FailureBaselineStore,
    // The baseline as of the start of the run. Never mutated.
    baseline: FailureBaseline,
    ignore_list: IgnoreList,
    watchdog: TimeoutWatchdog,
    summary_file: Option<Utf8PathBuf>,
    state: Mutex<RunState>,
}

#[derive(Debug)]
struct RunState {
    lifecycle: LifecycleState,
    status: RunAccumulator,
    // Tests that started and haven't reported back yet. Tests sharing an identifier are matched
    // up in start order.
    in_flight: HashMap<TestId, Vec<WatchdogToken>>,
    newly_failed: BTreeSet<TestId>,
    passed_previously_failing: BTreeSet<TestId>,
    timed_out: BTreeSet<TestId>,
    orphaned: BTreeSet<TestId>,
}

impl RunState {
    fn new() -> Self {
        Self {
            lifecycle: LifecycleState::Idle,
            status: RunAccumulator::new(),
            in_flight: HashMap::new(),
            newly_failed: BTreeSet::new(),
            passed_previously_failing: BTreeSet::new(),
            timed_out: BTreeSet::new(),
            orphaned: BTreeSet::new(),
        }
    }

    fn accept_test_event(&mut self, event: &'static str) -> Result<(), HarnessError> {
        match self.lifecycle {
            LifecycleState::Idle => {
                self.lifecycle = LifecycleState::RunInProgress;
                Ok(())
            }
            LifecycleState::RunInProgress => Ok(()),
            LifecycleState::Reconciling | LifecycleState::Done => {
                Err(HarnessError::RunFinished { event })
            }
        }
    }

    fn take_in_flight(&mut self, id: &TestId) -> Option<WatchdogToken> {
        let tokens = self.in_flight.get_mut(id)?;
        let token = (!tokens.is_empty()).then(|| tokens.remove(0));
        if tokens.is_empty() {
            self.in_flight.remove(id);
        }
        token
    }
}

impl HarnessController {
    /// Returns the mode this run is in.
    pub fn mode(&self) -> HarnessMode {
        self.mode
    }

    /// Returns the baseline as it was when the run started.
    pub fn baseline(&self) -> &FailureBaseline {
        &self.baseline
    }

    /// Returns the ignore list.
    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore_list
    }

    /// Returns the path of the baseline file.
    pub fn baseline_path(&self) -> &Utf8Path {
        self.store.path()
    }

    /// Returns where the run is in its lifecycle.
    pub fn lifecycle_state(&self) -> Result<LifecycleState, HarnessError> {
        Ok(self.lock_state()?.lifecycle)
    }

    /// Returns the counters accumulated so far.
    pub fn status(&self) -> Result<RunStatus, HarnessError> {
        Ok(self.lock_state()?.status.snapshot())
    }

    /// Handles the engine's `beforeEach` event: decides whether the test runs.
    ///
    /// Skipped tests have [`TestCase::skip`] called on them. Tests that run have the timeout
    /// watchdog armed.
    pub fn before_each(&self, test: &Arc<dyn TestCase>) -> Result<TestDisposition, HarnessError> {
        let id = TestId::from_title_path(test.title_path())?;

        let mut state = self.lock_state()?;
        state.accept_test_event("before_each")?;
        state.status.increment(StatusCounter::Total);

        let disposition = self.classify(&id, &mut state.status);
        match disposition {
            TestDisposition::Run => {
                tracing::debug!("running `{id}`");
                let token = self.watchdog.arm(id.clone(), Arc::clone(test));
                state.in_flight.entry(id).or_default().push(token);
            }
            TestDisposition::Skip(reason) => {
                drop(state);
                tracing::debug!("skipping `{id}` ({reason})");
                test.skip();
            }
        }

        Ok(disposition)
    }

    /// Handles the engine's `afterEach` event: records the test's result.
    pub fn after_each(&self, test: &Arc<dyn TestCase>) -> Result<(), HarnessError> {
        let id = TestId::from_title_path(test.title_path())?;

        let mut state = self.lock_state()?;
        state.accept_test_event("after_each")?;

        let Some(token) = state.take_in_flight(&id) else {
            // Skipped by the harness, so there's nothing to record.
            return Ok(());
        };

        let reported = test.state();
        let disarm = self.watchdog.disarm(&id, token);
        // A test that passed just as the watchdog fired keeps its pass.
        let timed_out = disarm == DisarmOutcome::Fired && reported != TestState::Passed;
        let result = if timed_out {
            tracing::warn!("{}", TestTimedOut::new(id.clone()));
            state.timed_out.insert(id.clone());
            TestState::Failed
        } else {
            reported
        };

        match result {
            TestState::Failed => self.record_failure(&mut state, id),
            TestState::Passed => {
                state.status.increment(StatusCounter::Passed);
                if self.mode == HarnessMode::Update && self.baseline.contains(&id) {
                    state.passed_previously_failing.insert(id);
                }
            }
            TestState::Skipped => {
                state.status.increment(StatusCounter::Skipped);
            }
            TestState::Pending => {
                tracing::warn!("`{id}` finished without passing or failing");
                state.orphaned.insert(id);
            }
        }

        Ok(())
    }

    /// Handles the engine's `after` event: reconciles the run against the baseline, persists the
    /// new baseline, and writes the summary to `writer`.
    ///
    /// Tests that started but never finished are excluded from the reconciliation, unless the
    /// watchdog has already failed them.
    pub fn after(
        &self,
        reporter: &SummaryReporter,
        writer: impl Write,
    ) -> Result<RunOutcome, HarnessError> {
        let mut state = self.lock_state()?;
        match state.lifecycle {
            LifecycleState::Idle | LifecycleState::RunInProgress => {}
            LifecycleState::Reconciling | LifecycleState::Done => {
                return Err(HarnessError::RunFinished { event: "after" });
            }
        }
        state.lifecycle = LifecycleState::Reconciling;

        let in_flight: Vec<_> = state.in_flight.drain().collect();
        let mut unfinished = Vec::new();
        for (id, tokens) in in_flight {
            let fired = tokens.into_iter().fold(false, |fired, token| {
                self.watchdog.disarm(&id, token) == DisarmOutcome::Fired || fired
            });
            if fired {
                // The watchdog already failed this test, so its result is known.
                tracing::warn!("{}", TestTimedOut::new(id.clone()));
                state.timed_out.insert(id.clone());
                self.record_failure(&mut state, id);
            } else {
                unfinished.push(id);
            }
        }
        self.watchdog.disarm_all();
        if !unfinished.is_empty() {
            tracing::warn!(
                "{} tests never finished and are excluded from the baseline update: {}",
                unfinished.len(),
                unfinished.iter().sorted().join(", "),
            );
        }
        state.orphaned.extend(unfinished);

        let (new_baseline, removed) = match self.mode {
            HarnessMode::Regression => (self.baseline.union(&state.newly_failed), BTreeSet::new()),
            HarnessMode::Update => {
                let removed = state.passed_previously_failing.clone();
                (self.baseline.difference(&removed), removed)
            }
        };

        let outcome = RunOutcome {
            mode: self.mode,
            status: state.status.snapshot(),
            baseline_path: self.store.path().to_owned(),
            baseline_before: self.baseline.len(),
            baseline_after: new_baseline.len(),
            newly_failed: state.newly_failed.clone(),
            removed,
            timed_out: state.timed_out.clone(),
            orphaned: state.orphaned.clone(),
        };
        outcome.log();

        self.store.save(&new_baseline)?;
        if let Some(summary_file) = &self.summary_file {
            write_summary_file(summary_file, &outcome.to_summary())?;
        }
        state.lifecycle = LifecycleState::Done;
        drop(state);

        reporter
            .write_summary(&outcome, writer)
            .map_err(HarnessError::SummaryWrite)?;
        Ok(outcome)
    }

    fn record_failure(&self, state: &mut RunState, id: TestId) {
        state.status.increment(StatusCounter::Failed);
        // Update mode only runs known failures, so this only applies to regression mode.
        if !self.baseline.contains(&id) {
            state.newly_failed.insert(id);
        }
    }

    fn classify(&self, id: &TestId, status: &mut RunAccumulator) -> TestDisposition {
        let ignored = self.ignore_list.contains(id);
        let known_failure = self.baseline.contains(id);

        match self.mode {
            HarnessMode::Regression => {
                // Both are counted when both apply.
                if ignored {
                    status.increment(StatusCounter::Ignored);
                }
                if known_failure {
                    status.increment(StatusCounter::SkipFailed);
                }
                match (ignored, known_failure) {
                    (true, true) => TestDisposition::Skip(SkipReason::IgnoredKnownFailure),
                    (true, false) => TestDisposition::Skip(SkipReason::Ignored),
                    (false, true) => TestDisposition::Skip(SkipReason::KnownFailure),
                    (false, false) => TestDisposition::Run,
                }
            }
            HarnessMode::Update => {
                if ignored {
                    status.increment(StatusCounter::Ignored);
                    TestDisposition::Skip(SkipReason::Ignored)
                } else if known_failure {
                    TestDisposition::Run
                } else {
                    status.increment(StatusCounter::Skipped);
                    TestDisposition::Skip(SkipReason::NotInBaseline)
                }
            }
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, RunState>, HarnessError> {
        self.state.lock().map_err(|_| HarnessError::StatePoisoned)
    }
}

/// The result of a completed run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunOutcome {
    /// The mode the run was performed in.
    pub mode: HarnessMode,

    /// Final counters.
    pub status: RunStatus,

    /// The baseline file that was rewritten.
    pub baseline_path: Utf8PathBuf,

    /// Known failures at the start of the run.
    pub baseline_before: usize,

    /// Known failures written at the end of the run.
    pub baseline_after: usize,

    /// Failures that weren't known failures at the start of the run. In regression mode these
    /// are regressions, and were added to the baseline.
    pub newly_failed: BTreeSet<TestId>,

    /// Known failures that passed and were removed from the baseline (update mode).
    pub removed: BTreeSet<TestId>,

    /// Tests failed by the timeout watchdog.
    pub timed_out: BTreeSet<TestId>,

    /// Tests that never passed or failed. These don't affect the baseline.
    pub orphaned: BTreeSet<TestId>,
}

impl RunOutcome {
    /// Returns true if this is a regression-mode run with at least one new failure.
    pub fn has_regression(&self) -> bool {
        self.mode == HarnessMode::Regression && !self.newly_failed.is_empty()
    }

    /// Returns the exit code the surrounding process should use.
    pub fn exit_code(&self) -> i32 {
        if self.has_regression() {
            FailgateExitCode::REGRESSION_DETECTED
        } else {
            FailgateExitCode::OK
        }
    }

    /// Converts this outcome to its machine-readable form.
    pub fn to_summary(&self) -> RunSummary {
        fn strings(ids: &BTreeSet<TestId>) -> BTreeSet<String> {
            ids.iter().map(|id| id.as_str().to_owned()).collect()
        }

        RunSummary {
            format_version: RunSummary::FORMAT_VERSION,
            mode: self.mode.to_summary(),
            status: self.status.to_summary(),
            baseline_path: self.baseline_path.to_string(),
            baseline_before: self.baseline_before,
            baseline_after: self.baseline_after,
            newly_failed: strings(&self.newly_failed),
            removed: strings(&self.removed),
            timed_out: strings(&self.timed_out),
            orphaned: strings(&self.orphaned),
        }
    }

    fn log(&self) {
        if self.has_regression() {
            tracing::error!(
                "regression detected: {} tests failed that are not known failures",
                self.newly_failed.len(),
            );
            for id in &self.newly_failed {
                tracing::error!("  {id}");
            }
        }
        if self.mode == HarnessMode::Update {
            tracing::info!(
                "removing {} now-passing tests from {}",
                self.removed.len(),
                self.baseline_path,
            );
            for id in &self.removed {
                tracing::info!("  {id}");
            }
        }
    }
}

fn write_summary_file(path: &Utf8Path, summary: &RunSummary) -> Result<(), HarnessError> {
    atomicwrites::AtomicFile::new(path, atomicwrites::AllowOverwrite)
        .write(|file| {
            serde_json::to_writer_pretty(&mut *file, summary)?;
            file.write_all(b"\n")
        })
        .map_err(|error| HarnessError::SummaryFileWrite {
            path: path.to_owned(),
            error,
        })
}
