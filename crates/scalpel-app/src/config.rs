//! Application configuration: the logger section plus the HTTP listener.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use scalpel_config::{ConfigLoader, ConfigResult, NONZERO, Report, Validate, Validated, Validator};
use scalpel_telemetry::{LoggerConfig, register_log_level_validation, register_logging_defaults};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Application name used for the default log directory and the info banner.
pub const APP_NAME: &str = "scalpel";
/// Prefix of environment overrides such as `SCALPEL_LOGS_FILE_LEVEL`.
pub const ENV_PREFIX: &str = "SCALPEL";
/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "SCALPEL_CONFIG";
/// File read from the working directory when present and no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

const DEFAULT_PORT: u16 = 8080;

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dual-sink logger settings.
    pub logs: LoggerConfig,
    /// HTTP listener settings.
    pub http: HttpConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// TCP port; must be non-zero.
    pub port: u16,
}

impl HttpConfig {
    /// Socket address of the listener.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Validate for AppConfig {
    fn validate(&self, report: &mut Report<'_>) -> ConfigResult<()> {
        self.logs.validate(report)?;
        report.check("http.port", &self.http.port.to_string(), &[NONZERO])
    }
}

/// Where configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Explicit file; a missing file is an error.
    pub file: Option<PathBuf>,
    /// File merged only when it exists.
    pub optional_file: Option<PathBuf>,
    /// Prefix of process environment overrides; `None` ignores the environment.
    pub env_prefix: Option<String>,
}

impl ConfigSources {
    /// Sources derived from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            file: std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from),
            optional_file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }
}

/// Register every application default on `loader`.
///
/// # Errors
///
/// Returns an error if a default key is malformed.
pub fn register_defaults(loader: &mut ConfigLoader) -> ConfigResult<()> {
    register_logging_defaults(loader, APP_NAME)?;
    loader.set_default("http.bind_addr", Ipv4Addr::LOCALHOST.to_string())?;
    loader.set_default("http.port", DEFAULT_PORT)?;
    Ok(())
}

/// Load, decode, and validate the application configuration.
///
/// Precedence, highest first: environment, explicit file (or the optional file when no
/// explicit one is given), defaults.
///
/// # Errors
///
/// Returns [`AppError::Config`] when a source cannot be read or parsed, the document
/// does not decode, or validation rejects a field.
pub fn load_config(sources: ConfigSources) -> AppResult<Validated<AppConfig>> {
    let mut loader = ConfigLoader::new();
    register_defaults(&mut loader).map_err(|err| AppError::config("defaults", err))?;

    if let Some(path) = sources.file.as_deref() {
        loader
            .merge_yaml_file(path)
            .map_err(|err| AppError::config("read_file", err))?;
    } else if let Some(path) = sources.optional_file.as_deref().filter(|path| exists(path)) {
        loader
            .merge_yaml_file(path)
            .map_err(|err| AppError::config("read_optional_file", err))?;
    }
    if let Some(prefix) = sources.env_prefix.as_deref() {
        loader.merge_env(prefix);
    }

    let config: AppConfig = loader
        .section("")
        .map_err(|err| AppError::config("decode", err))?;

    let mut validator = Validator::new();
    register_log_level_validation(&mut validator)
        .map_err(|err| AppError::config("register_rules", err))?;
    validator
        .validate(config)
        .map_err(|err| AppError::config("validate", err))
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use scalpel_config::ConfigError;
    use std::fs;

    fn env_sources(file: Option<PathBuf>) -> ConfigSources {
        ConfigSources {
            file,
            optional_file: None,
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }

    #[test]
    fn defaults_produce_valid_config() -> anyhow::Result<()> {
        let config = load_config(ConfigSources::default())?;
        assert_eq!(config.logs.file.path, "/var/log/scalpel");
        assert_eq!(config.logs.file.level, "info");
        assert_eq!(
            config.http.socket_addr(),
            SocketAddr::from(([127, 0, 0, 1], 8080))
        );
        Ok(())
    }

    #[test]
    fn env_beats_file_and_file_beats_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "scalpel.yaml",
                concat!(
                    "logs:\n  file:\n    level: warn\n  console:\n    level: error\n",
                    "http:\n  port: 9000\n",
                ),
            )?;
            jail.set_env("SCALPEL_LOGS_CONSOLE_LEVEL", "debug");
            jail.set_env("SCALPEL_HTTP_BIND_ADDR", "0.0.0.0");
            jail.set_env("UNRELATED_HTTP_PORT", 1);

            let path = jail.directory().join("scalpel.yaml");
            let config = load_config(env_sources(Some(path))).map_err(|err| err.to_string())?;
            assert_eq!(config.logs.file.level, "warn");
            assert_eq!(config.logs.console.level, "debug");
            assert_eq!(config.http.port, 9000);
            assert_eq!(config.http.bind_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
            Ok(())
        });
    }

    #[test]
    fn environment_is_ignored_without_prefix() {
        Jail::expect_with(|jail| {
            jail.set_env("SCALPEL_HTTP_PORT", 9999);
            let config = load_config(ConfigSources::default()).map_err(|err| err.to_string())?;
            assert_eq!(config.http.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(ConfigSources {
            file: Some(PathBuf::from("/definitely/missing/scalpel.yaml")),
            ..ConfigSources::default()
        });
        assert!(matches!(
            result,
            Err(AppError::Config {
                operation: "read_file",
                source: ConfigError::Read { .. }
            })
        ));
    }

    #[test]
    fn missing_optional_file_is_skipped() -> anyhow::Result<()> {
        let config = load_config(ConfigSources {
            optional_file: Some(PathBuf::from("/definitely/missing/config.yaml")),
            ..ConfigSources::default()
        })?;
        assert_eq!(config.http.port, 8080);
        Ok(())
    }

    #[test]
    fn malformed_file_fails_decode() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("scalpel.yaml");
        fs::write(&path, "http: [unterminated\n")?;
        let result = load_config(ConfigSources {
            file: Some(path),
            ..ConfigSources::default()
        });
        assert!(matches!(
            result,
            Err(AppError::Config {
                operation: "decode",
                source: ConfigError::Extract { .. }
            })
        ));
        Ok(())
    }

    #[test]
    fn validation_reports_every_bad_field() {
        Jail::expect_with(|jail| {
            jail.set_env("SCALPEL_LOGS_FILE_LEVEL", "loud");
            jail.set_env("SCALPEL_LOGS_CONSOLE_LEVEL", "quiet");
            jail.set_env("SCALPEL_HTTP_PORT", 0);

            let result = load_config(env_sources(None));
            let Err(AppError::Config {
                operation: "validate",
                source: ConfigError::Validation { violations },
            }) = result
            else {
                return Err("expected validation failure".into());
            };
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(
                fields,
                vec!["logs.file.level", "logs.console.level", "http.port"]
            );
            Ok(())
        });
    }
}
