// Copyright (c) The failgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Harness configuration.
//!
//! Configuration is layered: the defaults embedded in failgate come first, followed by either an
//! explicitly provided file or the optional `.config/failgate.toml` under the root directory.

use crate::{
    baseline::FailureBaselineStore, errors::ConfigParseError, ignore_list::IgnoreList,
    test_id::TestId,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::time::Duration;

/// Configuration for a failgate harness, rooted at a directory.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    root: Utf8PathBuf,
    inner: HarnessConfigImpl,
}

impl HarnessConfig {
    /// The default location of the config within the root directory.
    pub const CONFIG_PATH: &'static str = ".config/failgate.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the configuration for `root`.
    ///
    /// If `config_file` is specified it must exist. Otherwise `.config/failgate.toml` under
    /// `root` is used if present.
    pub fn from_sources(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let root = root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let inner = Self::make_default_config()
            .add_source(source)
            .build()
            .and_then(|config| config.try_deserialize::<HarnessConfigImpl>())
            .map_err(|err| ConfigParseError::new(config_file.clone(), err))?;
        tracing::debug!("loaded failgate config (user file: {config_file})");

        Ok(Self { root, inner })
    }

    /// Returns the default configuration for `root`, without reading any files.
    pub fn default_config(root: impl Into<Utf8PathBuf>) -> Result<Self, ConfigParseError> {
        let inner = Self::make_default_config()
            .build()
            .and_then(|config| config.try_deserialize::<HarnessConfigImpl>())
            .map_err(|err| ConfigParseError::new("<default config>", err))?;
        Ok(Self {
            root: root.into(),
            inner,
        })
    }

    /// Returns the root directory relative paths are resolved against.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the absolute path of the baseline file.
    pub fn baseline_path(&self) -> Utf8PathBuf {
        self.root.join(&self.inner.baseline.path)
    }

    /// Returns a store for the baseline file.
    pub fn baseline_store(&self) -> FailureBaselineStore {
        FailureBaselineStore::new(self.baseline_path())
    }

    /// Returns the per-test timeout bound.
    pub fn timeout(&self) -> Duration {
        self.inner.watchdog.timeout
    }

    /// Returns the absolute path of the machine-readable summary file, if one is configured.
    pub fn summary_file(&self) -> Option<Utf8PathBuf> {
        self.inner
            .report
            .summary_file
            .as_ref()
            .map(|path| self.root.join(path))
    }

    /// Returns the builtin ignore list extended with the configured entries.
    pub fn ignore_list(&self) -> IgnoreList {
        let mut ignore_list = IgnoreList::builtin();
        for entry in &self.inner.ignore {
            ignore_list.insert(TestId::new(entry.id.clone()), entry.reason.clone());
        }
        ignore_list
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HarnessConfigImpl {
    baseline: BaselineConfig,
    watchdog: WatchdogConfig,
    #[serde(default)]
    report: ReportConfig,
    #[serde(default)]
    ignore: Vec<IgnoreEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BaselineConfig {
    path: Utf8PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WatchdogConfig {
    #[serde(with = "humantime_serde")]
    timeout: Duration,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportConfig {
    #[serde(default)]
    summary_file: Option<Utf8PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct IgnoreEntry {
    id: String,
    #[serde(default)]
    reason: Option<String>,
}
