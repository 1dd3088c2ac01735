// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for failgate, a harness that tracks known test failures.
//!
//! A test engine drives a [`HarnessController`](controller::HarnessController) through its
//! lifecycle events. In regression mode, tests listed in a baseline file of known failures are
//! skipped and any new failure is recorded as a regression; in update mode, only known failures
//! run and the ones that now pass are dropped from the baseline.

pub mod baseline;
pub mod config;
pub mod controller;
pub mod errors;
pub mod helpers;
pub mod ignore_list;
pub mod lifecycle;
pub mod reporter;
pub mod status;
pub mod test_id;
pub mod watchdog;

#[cfg(test)]
mod test_helpers;
