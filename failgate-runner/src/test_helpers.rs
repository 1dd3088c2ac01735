// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::TestTimedOut,
    lifecycle::{TestCase, TestState},
    test_id::TestId,
};
use std::sync::{Arc, Mutex};

/// A test whose state is set by hand.
#[derive(Debug)]
pub(crate) struct MockTest {
    title_path: Vec<String>,
    inner: Mutex<MockTestInner>,
}

#[derive(Debug)]
struct MockTestInner {
    state: TestState,
    skipped: bool,
    timeouts: Vec<TestTimedOut>,
}

impl MockTest {
    pub(crate) fn new(title_path: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            title_path: title_path.iter().map(|s| (*s).to_owned()).collect(),
            inner: Mutex::new(MockTestInner {
                state: TestState::Pending,
                skipped: false,
                timeouts: Vec::new(),
            }),
        })
    }

    pub(crate) fn id(&self) -> TestId {
        TestId::from_title_path(&self.title_path).expect("mock tests have titles")
    }

    pub(crate) fn set_state(&self, state: TestState) {
        self.inner.lock().unwrap().state = state;
    }

    pub(crate) fn was_skipped(&self) -> bool {
        self.inner.lock().unwrap().skipped
    }

    pub(crate) fn timeouts(&self) -> Vec<TestTimedOut> {
        self.inner.lock().unwrap().timeouts.clone()
    }
}

impl TestCase for MockTest {
    fn title_path(&self) -> Vec<String> {
        self.title_path.clone()
    }

    fn state(&self) -> TestState {
        self.inner.lock().unwrap().state
    }

    fn skip(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.skipped = true;
        inner.state = TestState::Skipped;
    }

    fn force_fail(&self, error: TestTimedOut) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = TestState::Failed;
        inner.timeouts.push(error);
    }
}
