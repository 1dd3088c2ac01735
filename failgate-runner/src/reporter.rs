// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable end-of-run summaries.

use crate::{
    controller::{HarnessMode, RunOutcome},
    helpers::plural,
    status::StatusCounter,
    test_id::TestId,
};
use owo_colors::{OwoColorize, Style};
use std::{
    collections::BTreeSet,
    io::{self, Write},
};

/// Writes the summary of a completed run.
#[derive(Debug, Default)]
pub struct SummaryReporter {
    styles: Styles,
}

impl SummaryReporter {
    /// Creates a new reporter with colors disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Writes the summary for `outcome` to `writer`.
    pub fn write_summary(&self, outcome: &RunOutcome, mut writer: impl Write) -> io::Result<()> {
        writeln!(
            writer,
            "{:>12} {} mode",
            "Summary".style(self.styles.heading),
            outcome.mode.style(self.styles.bold),
        )?;

        for counter in StatusCounter::ALL {
            let value = outcome.status.get(counter);
            let style = match counter {
                StatusCounter::Failed if value > 0 => self.styles.fail,
                StatusCounter::Passed if value > 0 => self.styles.pass,
                _ => self.styles.count,
            };
            writeln!(writer, "{:>12} {:>6}", counter.label(), value.style(style))?;
        }

        match outcome.mode {
            HarnessMode::Regression => {
                self.write_ids(
                    "Regression",
                    self.styles.fail,
                    &format!(
                        "newly failing {}",
                        plural::tests_str(outcome.newly_failed.len())
                    ),
                    &outcome.newly_failed,
                    &mut writer,
                )?;
            }
            HarnessMode::Update => {
                // Always reported in update mode, even when nothing was removed.
                writeln!(
                    writer,
                    "{:>12} {} {} from the baseline",
                    "Removed".style(self.styles.pass),
                    outcome.removed.len().style(self.styles.bold),
                    plural::tests_str(outcome.removed.len()),
                )?;
                self.write_id_lines(&outcome.removed, &mut writer)?;
            }
        }

        self.write_ids(
            "Timed out",
            self.styles.warning,
            plural::tests_str(outcome.timed_out.len()),
            &outcome.timed_out,
            &mut writer,
        )?;
        self.write_ids(
            "Orphaned",
            self.styles.warning,
            &format!(
                "{} never finished",
                plural::tests_str(outcome.orphaned.len())
            ),
            &outcome.orphaned,
            &mut writer,
        )?;

        writeln!(
            writer,
            "{:>12} {} ({} -> {} {})",
            "Baseline".style(self.styles.heading),
            outcome.baseline_path.style(self.styles.bold),
            outcome.baseline_before.style(self.styles.bold),
            outcome.baseline_after.style(self.styles.bold),
            plural::known_failures_str(outcome.baseline_after),
        )?;

        Ok(())
    }

    fn write_ids(
        &self,
        status: &str,
        status_style: Style,
        description: &str,
        ids: &BTreeSet<TestId>,
        mut writer: impl Write,
    ) -> io::Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        writeln!(
            writer,
            "{:>12} {} {description}:",
            status.style(status_style),
            ids.len().style(self.styles.bold),
        )?;
        self.write_id_lines(ids, writer)
    }

    fn write_id_lines(&self, ids: &BTreeSet<TestId>, mut writer: impl Write) -> io::Result<()> {
        for id in ids {
            writeln!(writer, "{:>12} {}", "", id.style(self.styles.test_id))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Styles {
    bold: Style,
    heading: Style,
    count: Style,
    pass: Style,
    fail: Style,
    warning: Style,
    test_id: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.bold = Style::new().bold();
        self.heading = Style::new().green().bold();
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.warning = Style::new().yellow().bold();
        self.test_id = Style::new().blue();
    }
}
