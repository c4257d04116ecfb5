//! Named-rule validation for typed configuration models.
//!
//! # Design
//! - Rules are pure `fn(&str) -> bool` predicates registered under a name, so every
//!   field that shares a rule is checked by the same code.
//! - Models describe their checks through [`Validate`]; the validator collects every
//!   violation before failing so operators see all mistakes at once.
//! - A successful run yields [`Validated<T>`], which downstream constructors accept as
//!   proof that validation already happened.

use std::collections::BTreeMap;
use std::ops::Deref;

use crate::error::{ConfigError, ConfigResult, FieldViolation};

/// Predicate applied to a field's textual value.
pub type Rule = fn(&str) -> bool;

/// Rule rejecting empty or whitespace-only values.
pub const REQUIRED: &str = "required";
/// Rule rejecting numeric zero.
pub const NONZERO: &str = "nonzero";

/// Registry of named validation rules.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: BTreeMap<String, Rule>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a validator with the built-in `required` and `nonzero` rules.
    #[must_use]
    pub fn new() -> Self {
        let mut rules: BTreeMap<String, Rule> = BTreeMap::new();
        rules.insert(REQUIRED.to_string(), is_present);
        rules.insert(NONZERO.to_string(), is_nonzero);
        Self { rules }
    }

    /// Register a predicate under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRuleName`] for empty or whitespace-containing
    /// names and [`ConfigError::DuplicateRule`] when the name is taken.
    pub fn register_rule(&mut self, name: &str, rule: Rule) -> ConfigResult<()> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidRuleName {
                name: name.to_string(),
            });
        }
        if self.rules.contains_key(name) {
            return Err(ConfigError::DuplicateRule {
                rule: name.to_string(),
            });
        }
        self.rules.insert(name.to_string(), rule);
        Ok(())
    }

    /// Whether a rule with this name is registered.
    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Run a model's checks and wrap it on success.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] listing every violation, or
    /// [`ConfigError::UnknownRule`] if the model references an unregistered rule.
    pub fn validate<T: Validate>(&self, value: T) -> ConfigResult<Validated<T>> {
        let mut report = Report {
            validator: self,
            violations: Vec::new(),
        };
        value.validate(&mut report)?;
        if report.violations.is_empty() {
            Ok(Validated(value))
        } else {
            Err(ConfigError::Validation {
                violations: report.violations,
            })
        }
    }

    fn rule(&self, field: &str, name: &str) -> ConfigResult<Rule> {
        self.rules
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownRule {
                rule: name.to_string(),
                field: field.to_string(),
            })
    }
}

/// Collector handed to [`Validate::validate`].
pub struct Report<'a> {
    validator: &'a Validator,
    violations: Vec<FieldViolation>,
}

impl Report<'_> {
    /// Apply `rules` in order to `value`; the first failing rule is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRule`] when a rule name is not registered.
    pub fn check(&mut self, field: &str, value: &str, rules: &[&str]) -> ConfigResult<()> {
        for name in rules {
            let rule = self.validator.rule(field, name)?;
            if !rule(value) {
                self.violations.push(FieldViolation {
                    field: field.to_string(),
                    rule: (*name).to_string(),
                    value: value.to_string(),
                });
                break;
            }
        }
        Ok(())
    }

    /// Violations recorded so far.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }
}

/// Implemented by configuration models that declare per-field rules.
pub trait Validate {
    /// Record every field check against `report`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the checks themselves are malformed (for example an
    /// unknown rule name); rule failures are recorded on the report instead.
    fn validate(&self, report: &mut Report<'_>) -> ConfigResult<()>;
}

/// A configuration model that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    /// Unwrap the validated model.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Validated copy of a part of the model whose checks ran as part of this one.
    #[must_use]
    pub fn part<U: Clone>(&self, select: impl FnOnce(&T) -> &U) -> Validated<U> {
        Validated(select(&self.0).clone())
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

fn is_nonzero(value: &str) -> bool {
    value.trim().parse::<f64>().map_or(true, |number| number != 0.0)
}
