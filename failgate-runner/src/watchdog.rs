// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test timeout detection, independent of the engine's own timeouts.
//!
//! Arming spawns a deferred check on the tokio runtime and returns immediately. Arms are keyed by
//! test identifier, so any number of tests may be in flight at once. Each arm gets a fresh
//! [`WatchdogToken`], and the deferred check only fires if its token is still the one armed for
//! that test: a disarm that races with the timer wins or loses cleanly, and a timeout is never
//! reported twice.

use crate::{errors::TestTimedOut, lifecycle::TestCase, test_id::TestId};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{runtime::Handle, sync::oneshot};

/// The default timeout bound.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Identifies a single arm of the watchdog.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct WatchdogToken(u64);

/// The result of disarming the watchdog for a test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DisarmOutcome {
    /// The watchdog was cancelled before the bound elapsed.
    Cancelled,

    /// The bound elapsed while the test was still running, and the test was force-failed.
    Fired,

    /// The watchdog was not armed with this token: it was never armed, it was re-armed by a test
    /// with the same identifier, or it expired after the test had already finished.
    NotArmed,
}

#[derive(Debug)]
enum ArmState {
    Armed {
        token: WatchdogToken,
        // Dropping the sender wakes up the deferred check, which then exits.
        _cancel: oneshot::Sender<()>,
    },
    Fired {
        token: WatchdogToken,
    },
}

type Entries = Mutex<HashMap<TestId, ArmState>>;

/// Fails tests that neither pass nor fail within a bound.
#[derive(Debug)]
pub struct TimeoutWatchdog {
    bound: Duration,
    runtime: Handle,
    next_token: AtomicU64,
    entries: Arc<Entries>,
}

impl TimeoutWatchdog {
    /// Creates a new watchdog that spawns its deferred checks on `runtime`.
    pub fn new(bound: Duration, runtime: Handle) -> Self {
        Self {
            bound,
            runtime,
            next_token: AtomicU64::new(0),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the timeout bound.
    pub fn bound(&self) -> Duration {
        self.bound
    }

    /// Arms the watchdog for a test.
    ///
    /// If the test is already armed (two in-flight tests share an identifier), the earlier arm is
    /// cancelled and replaced.
    pub fn arm(&self, id: TestId, test: Arc<dyn TestCase>) -> WatchdogToken {
        let token = WatchdogToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let previous = lock(&self.entries).insert(
            id.clone(),
            ArmState::Armed {
                token,
                _cancel: cancel_tx,
            },
        );
        if let Some(ArmState::Armed { .. }) = previous {
            tracing::warn!("test `{id}` started while another test with the same id is running");
        }

        let entries = Arc::clone(&self.entries);
        let bound = self.bound;
        self.runtime.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(bound) => {}
                _ = cancel_rx => return,
            }
            fire(&entries, id, token, &*test);
        });

        token
    }

    /// Disarms the watchdog for a test.
    pub fn disarm(&self, id: &TestId, token: WatchdogToken) -> DisarmOutcome {
        let mut entries = lock(&self.entries);
        let outcome = match entries.get(id) {
            Some(ArmState::Armed { token: armed, .. }) if *armed == token => {
                DisarmOutcome::Cancelled
            }
            Some(ArmState::Fired { token: fired }) if *fired == token => DisarmOutcome::Fired,
            _ => return DisarmOutcome::NotArmed,
        };
        entries.remove(id);
        outcome
    }

    /// Disarms every test, returning the identifiers that were still armed or had fired.
    pub fn disarm_all(&self) -> Vec<TestId> {
        let mut entries = lock(&self.entries);
        entries.drain().map(|(id, _)| id).collect()
    }

    /// Returns the number of tests currently armed or fired but not yet disarmed.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns true if no tests are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fire(entries: &Entries, id: TestId, token: WatchdogToken, test: &dyn TestCase) {
    // Read the test state before taking the lock, since the engine may hold its own locks while
    // calling into the harness.
    let state = test.state();

    {
        let mut entries = lock(entries);
        match entries.get(&id) {
            Some(ArmState::Armed { token: armed, .. }) if *armed == token => {}
            // Disarmed or re-armed in the meantime.
            _ => return,
        }

        if state.is_terminal() {
            entries.remove(&id);
            tracing::debug!("watchdog expired for `{id}`, which already {state}");
            return;
        }
        entries.insert(id.clone(), ArmState::Fired { token });
    }

    tracing::debug!("watchdog fired for `{id}` (state: {state})");
    test.force_fail(TestTimedOut::new(id));
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<TestId, ArmState>> {
    // Nothing panics while the lock is held, so the map is consistent even if poisoned.
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
