//! Collector configuration, read from `config.toml` in the workspace.

use crate::collector::schedule;
use crate::collector::task::threshold_date;
use crate::utils::workspace::WORKSPACE_DIR;
use chrono::Utc;
use serde_derive::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

/// Default cron expression: every five minutes. Seconds come first.
pub const DEFAULT_CRON: &str = "0 0/5 * * * *";

/// Default number of days the first fetch of a repository reaches back.
pub const DEFAULT_COMMIT_THRESHOLD_DAYS: i64 = 15;

/// Config object for the collector
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Cron expression driving the scheduled cycles.
    #[serde(default = "default_cron")]
    pub cron: String,
    /// How many days back from now the fetch window may start.
    #[serde(default = "default_commit_threshold_days")]
    pub commit_threshold_days: i64,
    /// Settings of the `svn` command line client.
    #[serde(default)]
    pub svn: SvnConfig,
}

/// Settings of the `svn` command line client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SvnConfig {
    /// Path or name of the `svn` binary.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// User name passed to `svn --username`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password passed to `svn --password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_cron() -> String {
    DEFAULT_CRON.to_owned()
}

const fn default_commit_threshold_days() -> i64 {
    DEFAULT_COMMIT_THRESHOLD_DAYS
}

fn default_binary() -> String {
    "svn".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            commit_threshold_days: default_commit_threshold_days(),
            svn: SvnConfig::default(),
        }
    }
}

impl Default for SvnConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            username: None,
            password: None,
        }
    }
}

impl Config {
    /// File name of the config inside the workspace directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load the config of the workspace at `workspace_path`.
    /// `SVN_USERNAME` and `SVN_PASSWORD` override the credentials of the file.
    ///
    /// # Errors
    /// Will error if unable to find or parse the config file.
    pub fn load(workspace_path: &Path) -> anyhow::Result<Self> {
        let config_path = workspace_path.join(WORKSPACE_DIR).join(Self::FILE_NAME);
        let config_str = read_to_string(&config_path).map_err(|err| {
            anyhow::anyhow!("could not read {}: {err}", config_path.display())
        })?;
        let mut conf = Self::parse(&config_str)?;
        conf.apply_overrides(|key| std::env::var(key).ok());
        Ok(conf)
    }

    /// Parse a config from its toml representation.
    ///
    /// # Errors
    /// Will error if the toml is malformed, the threshold is negative or too large, or the cron
    /// expression is invalid.
    pub fn parse(config_str: &str) -> anyhow::Result<Self> {
        let conf: Self = toml::from_str(config_str)?;
        if conf.commit_threshold_days < 0 {
            anyhow::bail!(
                "commit_threshold_days must not be negative, got {}",
                conf.commit_threshold_days
            );
        }
        threshold_date(Utc::now(), conf.commit_threshold_days)?;
        schedule::parse(&conf.cron)?;
        Ok(conf)
    }

    /// Serialize the config to toml.
    ///
    /// # Errors
    /// Will error if serialization fails.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace credentials with the values `lookup` returns for `SVN_USERNAME` and `SVN_PASSWORD`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup("SVN_USERNAME") {
            self.svn.username = Some(username);
        }
        if let Some(password) = lookup("SVN_PASSWORD") {
            self.svn.password = Some(password);
        }
    }
}
