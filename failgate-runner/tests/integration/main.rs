// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod concurrency;
mod properties;
mod regression;
mod update;
