//! Logger configuration model, defaults, and validation rules.

use std::io::IsTerminal;
use std::path::Path;

use chrono::TimeDelta;
use scalpel_config::{ConfigLoader, ConfigResult, NONZERO, REQUIRED, Report, Validate};
use serde::{Deserialize, Serialize};

use crate::level::LOG_LEVEL_RULE;

/// Configuration key under which the logger settings live.
pub const LOGS_SECTION: &str = "logs";
/// File name written inside `logs.file.path`.
pub const LOG_FILE_NAME: &str = "server.log";
/// Level applied to both sinks when configuration does not say otherwise.
pub const DEFAULT_LEVEL: &str = "info";
/// Directory under which the default log path is created.
pub const DEFAULT_LOG_ROOT: &str = "/var/log";

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 10;
const DEFAULT_MAX_AGE_DAYS: u32 = 0;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Root logger configuration, decoded from the `logs` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Rotated JSON file sink.
    pub file: FileConfig,
    /// Human-readable stderr sink.
    pub console: ConsoleConfig,
}

/// File sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Minimum level written to the file.
    pub level: String,
    /// Directory holding `server.log` and its backups.
    pub path: String,
    /// Rotation bounds.
    #[serde(default)]
    pub rotation: RotationConfig,
}

/// Console sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Minimum level written to stderr.
    pub level: String,
    /// Whether level tags are coloured.
    #[serde(default)]
    pub color: ColorChoice,
}

/// Size and age bounds for the rotated log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Size in megabytes after which the file is rotated.
    pub max_size_mb: u64,
    /// Number of rotated backups to keep; `0` hands retention to `max_age_days`.
    pub max_backups: usize,
    /// Age in days after which backups are removed. Only applies when `max_backups`
    /// is `0`; `0` here as well keeps every backup.
    pub max_age_days: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

impl RotationConfig {
    /// Size limit in bytes.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Backup age limit, if any.
    #[must_use]
    pub fn max_age(&self) -> Option<TimeDelta> {
        if self.max_age_days == 0 {
            return None;
        }
        TimeDelta::try_days(i64::from(self.max_age_days))
    }
}

/// Colour selection for console output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Colour when stderr is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    /// Always emit ANSI colour codes.
    Always,
    /// Never emit ANSI colour codes.
    Never,
}

impl ColorChoice {
    /// Resolve the choice against the current process environment.
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
            }
        }
    }
}

impl Validate for LoggerConfig {
    fn validate(&self, report: &mut Report<'_>) -> ConfigResult<()> {
        report.check("logs.file.level", &self.file.level, &[REQUIRED, LOG_LEVEL_RULE])?;
        report.check("logs.file.path", &self.file.path, &[REQUIRED])?;
        report.check(
            "logs.file.rotation.max_size_mb",
            &self.file.rotation.max_size_mb.to_string(),
            &[NONZERO],
        )?;
        report.check(
            "logs.console.level",
            &self.console.level,
            &[REQUIRED, LOG_LEVEL_RULE],
        )
    }
}

/// Default log directory for an application: `/var/log/<app_name>`.
#[must_use]
pub fn default_log_dir(app_name: &str) -> String {
    Path::new(DEFAULT_LOG_ROOT)
        .join(app_name)
        .to_string_lossy()
        .into_owned()
}

/// Register the logger defaults on `loader`.
///
/// Every key gets a default so environment overrides can bind to it and so an absent
/// section still decodes into a complete [`LoggerConfig`].
///
/// # Errors
///
/// Returns an error if a default key is malformed.
pub fn register_logging_defaults(loader: &mut ConfigLoader, app_name: &str) -> ConfigResult<()> {
    let rotation = RotationConfig::default();
    loader.set_default("logs.file.path", default_log_dir(app_name))?;
    loader.set_default("logs.file.level", DEFAULT_LEVEL)?;
    loader.set_default("logs.file.rotation.max_size_mb", rotation.max_size_mb)?;
    loader.set_default("logs.file.rotation.max_backups", rotation.max_backups)?;
    loader.set_default("logs.file.rotation.max_age_days", rotation.max_age_days)?;
    loader.set_default("logs.console.level", DEFAULT_LEVEL)?;
    loader.set_default("logs.console.color", "auto")?;
    Ok(())
}
