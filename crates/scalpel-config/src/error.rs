//! Error types for configuration operations.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single rule failure recorded while validating a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path of the offending field (for example `logs.file.level`).
    pub field: String,
    /// Name of the rule that rejected the value.
    pub rule: String,
    /// Value received from configuration input.
    pub value: String,
}

impl Display for FieldViolation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "field '{}' failed '{}' validation: received {:?}",
            self.field, self.rule, self.value
        )
    }
}

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more fields were rejected by their validation rules.
    #[error("invalid configuration: {}", join_violations(.violations))]
    Validation {
        /// Every violation found, in field order.
        violations: Vec<FieldViolation>,
    },
    /// A field referenced a rule that was never registered.
    #[error("unknown validation rule '{rule}' on field '{field}'")]
    UnknownRule {
        /// Rule name referenced by the field.
        rule: String,
        /// Field that referenced the rule.
        field: String,
    },
    /// A rule with the same name was already registered.
    #[error("validation rule '{rule}' is already registered")]
    DuplicateRule {
        /// Rule name that collided.
        rule: String,
    },
    /// Rule names must be non-empty and free of whitespace.
    #[error("invalid validation rule name {name:?}")]
    InvalidRuleName {
        /// Rejected rule name.
        name: String,
    },
    /// Configuration keys must be non-empty dotted paths.
    #[error("invalid configuration key {key:?}")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
    /// Reading a configuration file failed.
    #[error("failed to read configuration file '{}'", path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A configuration layer failed to parse or a section did not match its typed model.
    #[error("failed to extract configuration section '{section}'")]
    Extract {
        /// Dotted key that was extracted; empty for the whole tree.
        section: String,
        /// Source figment error, naming the layer and key involved.
        source: Box<figment::Error>,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn validation_error_names_field_and_received_value() {
        let err = ConfigError::Validation {
            violations: vec![
                FieldViolation {
                    field: "logs.file.level".to_string(),
                    rule: "loglevel".to_string(),
                    value: "trace".to_string(),
                },
                FieldViolation {
                    field: "logs.file.path".to_string(),
                    rule: "required".to_string(),
                    value: String::new(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("'logs.file.level' failed 'loglevel' validation"));
        assert!(message.contains("received \"trace\""));
        assert!(message.contains("'logs.file.path' failed 'required'"));
    }

    #[test]
    fn extract_errors_keep_section_and_source() {
        let err = ConfigError::Extract {
            section: "logs".to_string(),
            source: Box::new(figment::Error::from("missing field `file`".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "failed to extract configuration section 'logs'"
        );
        assert!(err.source().is_some_and(|source| source.to_string().contains("file")));
    }

    #[test]
    fn io_backed_errors_expose_source() {
        let err = ConfigError::Read {
            path: PathBuf::from("config.yaml"),
            source: io::Error::other("io"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read configuration file 'config.yaml'"
        );
        assert!(err.source().is_some());
    }
}
