// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maintenance commands for failgate baselines.
//!
//! The harness itself lives in `failgate-runner` and is embedded into a test engine. This crate
//! provides the `failgate` binary, which inspects and rewrites baseline files between runs.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{Color, OutputContext, OutputWriter, StderrStyles};
