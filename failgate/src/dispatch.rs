// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter, StdoutStyles, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use failgate_metadata::{BaselineDiffSummary, BaselineSummary, FailgateExitCode};
use failgate_runner::{
    baseline::{FailureBaseline, FailureBaselineStore},
    config::HarnessConfig,
    helpers::plural,
    test_id::TestId,
};
use owo_colors::OwoColorize;
use std::io::Write;

/// Maintains failgate baselines of known test failures.
///
/// Test runs are driven by a test engine embedding failgate; set `UPDATE_FAILED=1` for the engine
/// to prune tests that now pass. These commands inspect and maintain the baseline file between
/// runs.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct FailgateApp {
    /// Root directory that relative paths are resolved against [default: current directory]
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<Utf8PathBuf>,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl FailgateApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let root = match self.root {
            Some(root) => root,
            None => current_dir()?,
        };
        let config = self.config_opts.make_config(&root)?;
        let styles = output.stdout_styles();
        let mut writer = output_writer.stdout_writer();

        let exit_code = match self.command {
            Command::Show { message_format } => {
                let store = config.baseline_store();
                let baseline = store.load()?;
                show(&store, &baseline, message_format, output, &styles, &mut writer)?;
                FailgateExitCode::OK
            }
            Command::Canonicalize => {
                let store = config.baseline_store();
                let baseline = store.load()?;
                store.save(&baseline)?;
                tracing::info!(
                    "canonicalized {} ({} {})",
                    store.path().style(styles.bold),
                    baseline.len().style(styles.bold),
                    plural::known_failures_str(baseline.len()),
                );
                FailgateExitCode::OK
            }
            Command::Diff {
                old,
                new,
                message_format,
            } => {
                let old = resolve(&root, &old);
                let new = resolve(&root, &new);
                let diff = diff(&old, &new)?;
                write_diff(&diff, message_format, &styles, &mut writer)?;
                if diff.is_empty() {
                    FailgateExitCode::OK
                } else {
                    FailgateExitCode::BASELINE_DIFFERS
                }
            }
            Command::Overlap => {
                let baseline = config.baseline_store().load()?;
                overlap(&config, &baseline, &styles, &mut writer)?;
                FailgateExitCode::OK
            }
        };

        writer.flush().map_err(ExpectedError::write_output)?;
        Ok(exit_code)
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: root/.config/failgate.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self, root: &Utf8Path) -> Result<HarnessConfig> {
        Ok(HarnessConfig::from_sources(root, self.config_file.as_deref())?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the known failures in the baseline
    Show {
        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormat,
    },

    /// Rewrite the baseline in canonical form (sorted, deduplicated, pretty-printed)
    Canonicalize,

    /// Compare two baseline files
    ///
    /// Exits with status 5 if the baselines differ.
    Diff {
        /// The older baseline
        old: Utf8PathBuf,

        /// The newer baseline
        new: Utf8PathBuf,

        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormat,
    },

    /// List known failures that are also ignored
    ///
    /// Such tests are skipped regardless of the baseline, and are counted both as ignored and as
    /// known failures.
    Overlap,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir =
        std::env::current_dir().map_err(|error| ExpectedError::CurrentDirFailed { error })?;
    Utf8PathBuf::from_path_buf(dir).map_err(|path| ExpectedError::RootNotUtf8 { path })
}

fn resolve(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        root.join(path)
    }
}

fn show(
    store: &FailureBaselineStore,
    baseline: &FailureBaseline,
    message_format: MessageFormat,
    output: OutputContext,
    styles: &StdoutStyles,
    mut writer: impl Write,
) -> Result<()> {
    match message_format {
        MessageFormat::Human => {
            if output.verbose {
                writeln!(
                    writer,
                    "{:>12} {} {} in {}",
                    "Baseline".style(styles.heading),
                    baseline.len().style(styles.bold),
                    plural::known_failures_str(baseline.len()),
                    store.path().style(styles.bold),
                )
                .map_err(ExpectedError::write_output)?;
            }
            for id in baseline.iter() {
                writeln!(writer, "{}", id.style(styles.test_id))
                    .map_err(ExpectedError::write_output)?;
            }
        }
        MessageFormat::Json => {
            let summary = BaselineSummary {
                path: store.path().to_string(),
                count: baseline.len(),
                tests: baseline.iter().map(|id| id.to_string()).collect(),
            };
            write_json(&summary, writer)?;
        }
    }
    Ok(())
}

fn diff(old: &Utf8Path, new: &Utf8Path) -> Result<BaselineDiffSummary> {
    let old_baseline = FailureBaselineStore::new(old).load()?;
    let new_baseline = FailureBaselineStore::new(new).load()?;

    let added = new_baseline
        .iter()
        .filter(|id| !old_baseline.contains(id))
        .map(|id| id.to_string())
        .collect();
    let removed = old_baseline
        .iter()
        .filter(|id| !new_baseline.contains(id))
        .map(|id| id.to_string())
        .collect();

    Ok(BaselineDiffSummary {
        old_path: old.to_string(),
        new_path: new.to_string(),
        added,
        removed,
    })
}

fn write_diff(
    diff: &BaselineDiffSummary,
    message_format: MessageFormat,
    styles: &StdoutStyles,
    mut writer: impl Write,
) -> Result<()> {
    match message_format {
        MessageFormat::Human => {
            let lines = diff
                .removed
                .iter()
                .map(|id| format!("{} {}", "-".style(styles.removed), id.style(styles.removed)))
                .chain(
                    diff.added
                        .iter()
                        .map(|id| format!("{} {}", "+".style(styles.added), id.style(styles.added))),
                );
            for line in lines {
                writeln!(writer, "{line}").map_err(ExpectedError::write_output)?;
            }
            writeln!(
                writer,
                "{:>12} {} added, {} removed",
                "Diff".style(styles.heading),
                diff.added.len().style(styles.bold),
                diff.removed.len().style(styles.bold),
            )
            .map_err(ExpectedError::write_output)?;
        }
        MessageFormat::Json => write_json(diff, writer)?,
    }
    Ok(())
}

fn overlap(
    config: &HarnessConfig,
    baseline: &FailureBaseline,
    styles: &StdoutStyles,
    mut writer: impl Write,
) -> Result<()> {
    let ignore_list = config.ignore_list();
    let overlapping: Vec<(&TestId, Option<&str>)> = ignore_list
        .iter()
        .filter(|(id, _)| baseline.contains(id))
        .collect();

    for (id, reason) in &overlapping {
        let result = match reason {
            Some(reason) => writeln!(
                writer,
                "{} ({})",
                id.style(styles.test_id),
                reason.style(styles.reason)
            ),
            None => writeln!(writer, "{}", id.style(styles.test_id)),
        };
        result.map_err(ExpectedError::write_output)?;
    }

    tracing::info!(
        "{} {} both ignored and known to fail",
        overlapping.len(),
        plural::tests_str(overlapping.len()),
    );
    Ok(())
}

fn write_json(value: &impl serde::Serialize, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).map_err(ExpectedError::serialize_output)?;
    writeln!(writer).map_err(ExpectedError::write_output)
}
