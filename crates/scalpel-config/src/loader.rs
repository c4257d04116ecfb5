//! Layered configuration loading on top of `figment`.
//!
//! # Design
//! - Precedence is fixed: environment over YAML documents over defaults. Defaults are
//!   joined rather than merged, so registering one late never hides a document value.
//! - Environment overrides bind only keys that already exist in a lower layer. Key
//!   segments may contain underscores (`max_backups`), so names are matched against
//!   known keys instead of being split on `_`.
//! - Documents are parsed lazily; syntax errors surface from [`ConfigLoader::section`].

use std::fs;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::{Dict, Uncased, UncasedStr, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, ConfigResult};

/// Builder that accumulates configuration layers and decodes typed sections.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    figment: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
        }
    }

    /// Register the default for a dotted key such as `logs.file.level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] when the key is empty or has empty segments.
    pub fn set_default<T: Serialize>(&mut self, key: &str, value: T) -> ConfigResult<()> {
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(ConfigError::InvalidKey {
                key: key.to_string(),
            });
        }
        self.update(|figment| figment.join(Serialized::default(key, value)));
        Ok(())
    }

    /// Merge a YAML document over previously merged documents.
    pub fn merge_yaml_str(&mut self, document: &str) {
        self.update(|figment| figment.merge(Yaml::string(document)));
    }

    /// Merge a YAML file over previously merged documents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file does not exist or cannot be inspected.
    pub fn merge_yaml_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        fs::metadata(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.update(|figment| figment.merge(Yaml::file(path)));
        Ok(())
    }

    /// Merge process environment overrides.
    ///
    /// A variable named `<PREFIX>_LOGS_FILE_LEVEL` overrides `logs.file.level`. Values
    /// keep their scalar types, so `9000` decodes as a number and `true` as a bool.
    pub fn merge_env(&mut self, prefix: &str) {
        let known = self.leaf_keys();
        let env = Env::prefixed(&format!("{}_", prefix.to_ascii_uppercase())).filter_map(
            move |name: &UncasedStr| {
                known
                    .iter()
                    .find(|key| key.replace('.', "_").eq_ignore_ascii_case(name.as_str()))
                    .map(|key| Uncased::from(key.clone()))
            },
        );
        self.update(|figment| figment.merge(env));
    }

    /// Decode the value at `key` into `T`; an empty key decodes the whole tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extract`] when a layer fails to parse, the key is missing,
    /// or the value does not match `T`.
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        let extracted = if key.is_empty() {
            self.figment.extract()
        } else {
            self.figment.extract_inner(key)
        };
        extracted.map_err(|source| ConfigError::Extract {
            section: key.to_string(),
            source: Box::new(source),
        })
    }

    fn leaf_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let Ok(tree) = self.figment.extract::<Dict>() {
            collect_leaf_keys(&tree, "", &mut keys);
        }
        keys
    }

    fn update(&mut self, apply: impl FnOnce(Figment) -> Figment) {
        let figment = std::mem::replace(&mut self.figment, Figment::new());
        self.figment = apply(figment);
    }
}

fn collect_leaf_keys(tree: &Dict, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in tree {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Dict(_, child) if !child.is_empty() => collect_leaf_keys(child, &path, out),
            _ => out.push(path),
        }
    }
}
