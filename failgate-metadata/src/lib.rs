// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for [failgate](https://crates.io/crates/failgate).
//!
//! failgate tracks a baseline of known-failing tests for a large compatibility suite. This crate
//! documents the process exit codes it uses, and provides serde types for the JSON documents it
//! writes: end-of-run summaries and baseline listings.
//!
//! This crate is kept on an older MSRV and edition so that tools which only consume these
//! documents don't need to track the rest of failgate.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
